//! Transaction draft model.
//!
//! A draft is an ordered list of commands handed to the wallet collaborator
//! for signing and execution; this crate never signs anything. Coin handles
//! index the command that produced them, so a handle can only ever refer to
//! an instruction appended before its first use.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Reference to one result of an earlier command in the same draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CoinHandle {
    pub command: usize,
    pub result: u16,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CallArg {
    /// An owned or shared object by id; the wallet resolves the reference.
    Object(String),
    /// A BCS-encodable pure value, carried as JSON for the wallet to encode.
    Pure(Value),
    /// A result of an earlier command.
    Result(CoinHandle),
    /// The `0x6` clock object.
    Clock,
    /// The `0x5` system state object.
    SystemState,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoveCall {
    /// `package::module::function`.
    pub target: String,
    pub type_args: Vec<String>,
    pub args: Vec<CallArg>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Command {
    MoveCall(MoveCall),
    MergeCoins { destination: CoinHandle, sources: Vec<CoinHandle> },
    TransferObjects { objects: Vec<CoinHandle>, recipient: String },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransactionDraft {
    pub sender: Option<String>,
    commands: Vec<Command>,
}

impl TransactionDraft {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sender(sender: &str) -> Self {
        Self { sender: Some(sender.to_string()), commands: Vec::new() }
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Append a move call and return a handle to its first result.
    pub fn move_call(
        &mut self,
        target: &str,
        type_args: Vec<String>,
        args: Vec<CallArg>,
    ) -> CoinHandle {
        self.commands.push(Command::MoveCall(MoveCall {
            target: target.to_string(),
            type_args,
            args,
        }));
        CoinHandle { command: self.commands.len() - 1, result: 0 }
    }

    /// Append a move call returning `results` values and hand back one handle
    /// per result, in order.
    pub fn move_call_multi(
        &mut self,
        target: &str,
        type_args: Vec<String>,
        args: Vec<CallArg>,
        results: u16,
    ) -> Vec<CoinHandle> {
        let handle = self.move_call(target, type_args, args);
        (0..results).map(|result| CoinHandle { command: handle.command, result }).collect()
    }

    pub fn merge_coins(&mut self, destination: CoinHandle, sources: Vec<CoinHandle>) {
        debug_assert!(destination.command < self.commands.len());
        debug_assert!(sources.iter().all(|s| s.command < self.commands.len()));
        if sources.is_empty() {
            return;
        }
        self.commands.push(Command::MergeCoins { destination, sources });
    }

    pub fn transfer_objects(&mut self, objects: Vec<CoinHandle>, recipient: &str) {
        debug_assert!(objects.iter().all(|o| o.command < self.commands.len()));
        if objects.is_empty() {
            return;
        }
        self.commands
            .push(Command::TransferObjects { objects, recipient: recipient.to_string() });
    }

    /// Merge a set of coin handles into the first one, returning it.
    /// No-op merge for a single handle.
    pub fn merge_into_first(&mut self, mut coins: Vec<CoinHandle>) -> Option<CoinHandle> {
        if coins.is_empty() {
            return None;
        }
        let destination = coins.remove(0);
        self.merge_coins(destination, coins);
        Some(destination)
    }
}

pub fn pure_u64(value: u64) -> CallArg {
    CallArg::Pure(Value::from(value))
}

pub fn pure_str(value: &str) -> CallArg {
    CallArg::Pure(Value::from(value))
}

pub fn pure_bool(value: bool) -> CallArg {
    CallArg::Pure(Value::from(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handles_index_their_producing_command() {
        let mut tx = TransactionDraft::with_sender("0xabc");
        let first = tx.move_call("0x1::m::claim", vec!["0x2::sui::SUI".into()], vec![CallArg::Clock]);
        let second = tx.move_call("0x1::m::claim", vec![], vec![]);
        assert_eq!(first.command, 0);
        assert_eq!(second.command, 1);

        tx.merge_coins(first, vec![second]);
        tx.transfer_objects(vec![first], "0xabc");
        assert_eq!(tx.commands().len(), 4);

        // Every referenced handle points at an earlier command.
        for (index, command) in tx.commands().iter().enumerate() {
            match command {
                Command::MergeCoins { destination, sources } => {
                    assert!(destination.command < index);
                    assert!(sources.iter().all(|s| s.command < index));
                }
                Command::TransferObjects { objects, .. } => {
                    assert!(objects.iter().all(|o| o.command < index));
                }
                Command::MoveCall(_) => {}
            }
        }
    }

    #[test]
    fn multi_result_handles_share_the_command() {
        let mut tx = TransactionDraft::new();
        let handles = tx.move_call_multi("0x1::m::collect", vec![], vec![], 2);
        assert_eq!(handles.len(), 2);
        assert_eq!(handles[0].command, handles[1].command);
        assert_eq!(handles[1].result, 1);
    }

    #[test]
    fn empty_merge_and_transfer_are_dropped() {
        let mut tx = TransactionDraft::new();
        let coin = tx.move_call("0x1::m::claim", vec![], vec![]);
        tx.merge_coins(coin, vec![]);
        tx.transfer_objects(vec![], "0xabc");
        assert_eq!(tx.commands().len(), 1);
    }

    #[test]
    fn merge_into_first_collapses_coins() {
        let mut tx = TransactionDraft::new();
        let a = tx.move_call("0x1::m::claim", vec![], vec![]);
        let b = tx.move_call("0x1::m::claim", vec![], vec![]);
        let merged = tx.merge_into_first(vec![a, b]).unwrap();
        assert_eq!(merged, a);
        assert!(matches!(tx.commands().last(), Some(Command::MergeCoins { .. })));
        assert_eq!(tx.merge_into_first(vec![]), None);
    }
}
