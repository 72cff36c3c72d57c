use snapmig_types::protocol::TRANSACTION_ID_LENGTH;
use snapmig_types::{Address, MessageId, OutputId, TransactionId, MAX_OUTPUTS_PER_GROUP};

use crate::error::{SnapshotError, SnapshotResult};
use crate::record::{Output, OUTPUT_TYPE_SIG_LOCKED_SINGLE};

/// Deterministic output ids for outputs not created by a real transaction.
///
/// Ids are handed out in groups of [`MAX_OUTPUTS_PER_GROUP`] sharing one
/// synthetic transaction id. The first group uses the all-zero transaction
/// id; each following group stores its 16-bit counter little-endian in the
/// last two bytes of the transaction id, so at most 65536 groups exist.
#[derive(Clone, Debug, Default)]
pub struct SyntheticOutputIds {
    transaction_id: [u8; TRANSACTION_ID_LENGTH],
    group: u16,
    index: u16,
    exhausted: bool,
}

impl SyntheticOutputIds {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&mut self) -> SnapshotResult<OutputId> {
        if self.exhausted {
            return Err(SnapshotError::SyntheticIdsExhausted { groups: 1 << 16 });
        }
        if self.index == MAX_OUTPUTS_PER_GROUP {
            let Some(group) = self.group.checked_add(1) else {
                self.exhausted = true;
                return Err(SnapshotError::SyntheticIdsExhausted { groups: 1 << 16 });
            };
            self.group = group;
            self.index = 0;
            self.transaction_id[TRANSACTION_ID_LENGTH - 2..].copy_from_slice(&group.to_le_bytes());
        }
        let id = OutputId::from_parts(&TransactionId::new(self.transaction_id), self.index);
        self.index += 1;
        Ok(id)
    }
}

/// Turns `(address, amount)` pairs into genesis outputs with synthetic ids
/// and a null message id. Stops after the first error.
pub struct SyntheticOutputs<I> {
    inner: I,
    ids: SyntheticOutputIds,
    failed: bool,
}

impl<I> Iterator for SyntheticOutputs<I>
where
    I: Iterator<Item = (Address, u64)>,
{
    type Item = SnapshotResult<Output>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let (address, amount) = self.inner.next()?;
        match self.ids.next_id() {
            Ok(output_id) => Some(Ok(Output {
                message_id: MessageId::null(),
                output_id,
                output_type: OUTPUT_TYPE_SIG_LOCKED_SINGLE,
                address,
                amount,
            })),
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}

pub fn synthesize_outputs<I>(targets: I) -> SyntheticOutputs<I::IntoIter>
where
    I: IntoIterator<Item = (Address, u64)>,
{
    SyntheticOutputs {
        inner: targets.into_iter(),
        ids: SyntheticOutputIds::new(),
        failed: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use snapmig_types::Ed25519Address;

    #[test]
    fn first_group_uses_null_transaction() {
        let mut ids = SyntheticOutputIds::new();
        for i in 0..MAX_OUTPUTS_PER_GROUP {
            let id = ids.next_id().unwrap();
            assert!(id.transaction_id().is_null());
            assert_eq!(id.index(), i);
        }
    }

    #[test]
    fn rollover_after_a_full_group() {
        let mut ids = SyntheticOutputIds::new();
        let generated: Vec<OutputId> = (0..MAX_OUTPUTS_PER_GROUP as usize + 1)
            .map(|_| ids.next_id().unwrap())
            .collect();
        let last = generated[MAX_OUTPUTS_PER_GROUP as usize];
        assert_eq!(last.index(), 0);
        let tx = last.transaction_id();
        assert_eq!(&tx.as_bytes()[30..], &[1, 0]);
        assert!(tx.as_bytes()[..30].iter().all(|b| *b == 0));
    }

    #[test]
    fn ids_are_unique_across_groups() {
        let mut ids = SyntheticOutputIds::new();
        let mut seen = std::collections::HashSet::new();
        for _ in 0..1_000 {
            assert!(seen.insert(ids.next_id().unwrap()));
        }
    }

    #[test]
    fn exhaustion_is_an_error() {
        let mut ids = SyntheticOutputIds {
            group: u16::MAX,
            index: MAX_OUTPUTS_PER_GROUP,
            ..SyntheticOutputIds::default()
        };
        let err = ids.next_id().unwrap_err();
        assert!(matches!(err, SnapshotError::SyntheticIdsExhausted { groups: 65536 }));
        assert!(ids.next_id().is_err());
    }

    #[test]
    fn synthesized_outputs_carry_amounts() {
        let addr = Address::from(Ed25519Address::new([1u8; 32]));
        let outputs: Vec<Output> = synthesize_outputs(vec![(addr, 5), (addr, 7)])
            .collect::<SnapshotResult<_>>()
            .unwrap();
        assert_eq!(outputs.len(), 2);
        assert_eq!(outputs[1].amount, 7);
        assert_eq!(outputs[1].output_id.index(), 1);
        assert!(outputs[0].message_id.is_null());
    }
}
