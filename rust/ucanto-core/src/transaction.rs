//! Results together with the follow-up tasks they spawned.

use serde::{Deserialize, Serialize};
use ucanto_car::Link;

use crate::Outcome;

/// Tasks an invocation produced besides its result.
///
/// `fork` tasks run concurrently with whatever comes next; the optional
/// `join` task is the continuation the result should be threaded into.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Effects {
    #[serde(default)]
    pub fork: Vec<Link>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub join: Option<Link>,
}

impl Effects {
    pub fn new(fork: Vec<Link>, join: Option<Link>) -> Self {
        Effects { fork, join }
    }

    /// Getter for the forked tasks
    pub fn fork(&self) -> &[Link] {
        &self.fork
    }

    /// Getter for the join task
    pub fn join(&self) -> Option<&Link> {
        self.join.as_ref()
    }

    /// Whether no task was forked or joined.
    pub fn is_empty(&self) -> bool {
        self.fork.is_empty() && self.join.is_none()
    }

    /// Every task link: forks in order, then the join.
    pub fn links(&self) -> impl Iterator<Item = &Link> {
        self.fork.iter().chain(self.join.iter())
    }
}

/// The result of running an invocation, as a receipt reports it.
// Field order is the canonical DAG-CBOR key order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction<O, X> {
    #[serde(default)]
    fx: Effects,
    out: Outcome<O, X>,
}

impl<O, X> Transaction<O, X> {
    /// A transaction with no effects.
    pub fn new(out: Outcome<O, X>) -> Self {
        Transaction {
            fx: Effects::default(),
            out,
        }
    }

    pub fn with_effects(mut self, fx: Effects) -> Self {
        self.fx = fx;
        self
    }

    /// Getter for the outcome
    pub fn out(&self) -> &Outcome<O, X> {
        &self.out
    }

    /// Getter for the effects
    pub fn fx(&self) -> &Effects {
        &self.fx
    }

    pub fn into_parts(self) -> (Outcome<O, X>, Effects) {
        (self.out, self.fx)
    }
}

impl<O, X> From<Outcome<O, X>> for Transaction<O, X> {
    fn from(out: Outcome<O, X>) -> Self {
        Transaction::new(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Failure;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use testresult::TestResult;
    use ucanto_car::{Hashers, Prefix, hash::SHA2_256, link::RAW};

    fn task(name: &[u8]) -> Result<Link, ucanto_car::CarError> {
        Prefix::v1(RAW, SHA2_256).sum(name, &Hashers::default())
    }

    #[test]
    fn it_starts_without_effects() {
        let transaction: Transaction<u8, Failure> = Transaction::new(Outcome::Ok(1));

        assert!(transaction.fx().is_empty());
        assert_eq!(transaction.out(), &Outcome::Ok(1));
    }

    #[test]
    fn it_lists_forks_before_the_join() -> TestResult {
        let (first, second, join) = (task(b"first")?, task(b"second")?, task(b"join")?);
        let transaction: Transaction<(), Failure> = Transaction::new(Outcome::Ok(()))
            .with_effects(Effects::new(vec![first, second], Some(join)));

        let (_, fx) = transaction.into_parts();
        assert!(!fx.is_empty());
        assert_eq!(fx.links().copied().collect::<Vec<_>>(), vec![first, second, join]);
        assert_eq!(fx.join(), Some(&join));
        Ok(())
    }

    #[test]
    fn it_serializes_result_and_effects() -> TestResult {
        let transaction: Transaction<String, Failure> =
            Transaction::from(Outcome::Error(Failure::new("denied")));

        assert_eq!(
            serde_json::to_value(&transaction)?,
            json!({ "fx": { "fork": [] }, "out": { "error": { "message": "denied" } } })
        );
        Ok(())
    }

    #[test]
    fn it_round_trips_effect_links_through_dag_cbor() -> TestResult {
        let fx = Effects::new(vec![task(b"fork")?], Some(task(b"join")?));
        let transaction: Transaction<u64, Failure> =
            Transaction::new(Outcome::Ok(7)).with_effects(fx);

        let bytes = serde_ipld_dagcbor::to_vec(&transaction)?;
        let decoded: Transaction<u64, Failure> = serde_ipld_dagcbor::from_slice(&bytes)?;

        assert_eq!(decoded, transaction);
        Ok(())
    }
}
