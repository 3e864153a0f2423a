//! Sequential composition of independent asynchronous values.
//!
//! [`chain()`] resolves three futures one after the other and records each value as it is
//! observed. A fourth, unrelated future is joined with the first step; whenever it resolves, the
//! three chained values are still observed in order.

use std::fmt;
use std::future::Future;

use futures_util::future;

/// A value observed by [`chain()`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Observation<T, U> {
    /// One of the three chained values.
    Step(T),

    /// The unrelated value joined with the first step.
    Unrelated(U),
}

/// Resolves `first`, `second` and `third` in that order, and returns everything in the order it
/// was observed.
///
/// `unrelated` is polled together with `first`; its value is observed right after the first
/// step's.
#[tracing::instrument(level = "debug", skip_all)]
pub async fn chain<T, U>(
    first: impl Future<Output = T>,
    second: impl Future<Output = T>,
    third: impl Future<Output = T>,
    unrelated: impl Future<Output = U>,
) -> Vec<Observation<T, U>>
where
    T: fmt::Debug,
    U: fmt::Debug,
{
    let mut observed = Vec::with_capacity(4);
    let (value, unrelated) = future::join(first, unrelated).await;

    observe(&mut observed, Observation::Step(value));
    observe(&mut observed, Observation::Unrelated(unrelated));
    observe(&mut observed, Observation::Step(second.await));
    observe(&mut observed, Observation::Step(third.await));

    observed
}

/// The chained values of `observations`, in order.
pub fn steps<T, U>(observations: impl IntoIterator<Item = Observation<T, U>>) -> Vec<T> {
    observations
        .into_iter()
        .filter_map(|observation| match observation {
            Observation::Step(value) => Some(value),
            Observation::Unrelated(_) => None,
        })
        .collect()
}

fn observe<T, U>(observed: &mut Vec<Observation<T, U>>, observation: Observation<T, U>)
where
    T: fmt::Debug,
    U: fmt::Debug,
{
    debug!(?observation, "observed value");
    observed.push(observation);
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::testing;

    async fn after<T>(delay: Duration, value: T) -> T {
        tokio::time::sleep(delay).await;
        value
    }

    #[tokio::test]
    async fn ready_values_are_observed_in_order() -> color_eyre::Result<()> {
        let observed = chain(
            future::ready(1),
            future::ready(2),
            future::ready(3),
            future::ready("unrelated"),
        )
        .await;

        testing::assert_eq!(
            observed,
            vec![
                Observation::Step(1),
                Observation::Unrelated("unrelated"),
                Observation::Step(2),
                Observation::Step(3),
            ]
        );

        Ok(())
    }

    #[tokio::test]
    async fn order_does_not_depend_on_resolution_time() -> color_eyre::Result<()> {
        let observed = chain(
            after(Duration::from_millis(30), 1),
            after(Duration::from_millis(10), 2),
            future::ready(3),
            future::ready(4),
        )
        .await;

        testing::assert_eq!(steps(observed), [1, 2, 3]);

        Ok(())
    }

    #[tokio::test]
    async fn slow_unrelated_value_does_not_reorder_steps() -> color_eyre::Result<()> {
        let observed = chain(
            future::ready(1),
            future::ready(2),
            future::ready(3),
            after(Duration::from_millis(20), 4),
        )
        .await;

        testing::assert_eq!(observed[1], Observation::Unrelated(4));
        testing::assert_eq!(steps(observed), [1, 2, 3]);

        Ok(())
    }
}
