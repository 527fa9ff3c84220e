//! Slot, epoch and wall-clock calculations

const BYRON_SLOT_LENGTH: u64 = 20;
const BYRON_SLOTS_PER_EPOCH: u64 = 21_600;
pub const SHELLEY_SLOT_LENGTH: u64 = 1;
pub const SHELLEY_SLOTS_PER_EPOCH: u64 = 432_000;

/// Derive an epoch number from a slot, handling the Byron/Shelley slot
/// length change at the Shelley boundary
pub fn slot_to_epoch_with_shelley_params(
    slot: u64,
    shelley_epoch: u64,
    shelley_epoch_len: u64,
) -> (u64, u64) {
    let shelley_start_slot = shelley_epoch * BYRON_SLOTS_PER_EPOCH;
    if slot < shelley_start_slot {
        (slot / BYRON_SLOTS_PER_EPOCH, slot % BYRON_SLOTS_PER_EPOCH)
    } else {
        let since = slot - shelley_start_slot;
        (shelley_epoch + since / shelley_epoch_len, since % shelley_epoch_len)
    }
}

/// First slot of an epoch
pub fn epoch_to_first_slot_with_shelley_params(
    epoch: u64,
    shelley_epoch: u64,
    shelley_epoch_len: u64,
) -> u64 {
    if epoch < shelley_epoch {
        epoch * BYRON_SLOTS_PER_EPOCH
    } else {
        shelley_epoch * BYRON_SLOTS_PER_EPOCH + (epoch - shelley_epoch) * shelley_epoch_len
    }
}

/// Convert a slot number to a unix timestamp (seconds), given the chain
/// start time. Byron slots are 20s, Shelley slots 1s.
pub fn slot_to_timestamp_with_params(slot: u64, byron_timestamp: u64, shelley_epoch: u64) -> u64 {
    let shelley_start_slot = shelley_epoch * BYRON_SLOTS_PER_EPOCH;
    if slot < shelley_start_slot {
        byron_timestamp + slot * BYRON_SLOT_LENGTH
    } else {
        byron_timestamp
            + shelley_start_slot * BYRON_SLOT_LENGTH
            + (slot - shelley_start_slot) * SHELLEY_SLOT_LENGTH
    }
}
