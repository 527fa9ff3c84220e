use crate::{
    calculations::{
        epoch_to_first_slot_with_shelley_params, slot_to_epoch_with_shelley_params,
        slot_to_timestamp_with_params, SHELLEY_SLOTS_PER_EPOCH,
    },
    rational_number::RationalNumber,
};

/// Chain constants needed to translate slots to epochs and wall-clock
/// time, plus the security/activity parameters that bound how far ahead
/// those translations stay reliable.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct GenesisValues {
    pub byron_timestamp: u64,
    pub shelley_epoch: u64,
    pub shelley_epoch_len: u64,

    /// Ouroboros security parameter k
    pub security_param: u64,

    /// Active slot coefficient f
    pub active_slots_coeff: RationalNumber,
}

impl GenesisValues {
    pub fn mainnet() -> Self {
        Self {
            byron_timestamp: 1506203091,
            shelley_epoch: 208,
            shelley_epoch_len: SHELLEY_SLOTS_PER_EPOCH,
            security_param: 2160,
            active_slots_coeff: RationalNumber::new(1, 20),
        }
    }

    pub fn slot_to_epoch(&self, slot: u64) -> (u64, u64) {
        slot_to_epoch_with_shelley_params(slot, self.shelley_epoch, self.shelley_epoch_len)
    }

    pub fn slot_to_timestamp(&self, slot: u64) -> u64 {
        slot_to_timestamp_with_params(slot, self.byron_timestamp, self.shelley_epoch)
    }

    pub fn epoch_to_first_slot(&self, epoch: u64) -> u64 {
        epoch_to_first_slot_with_shelley_params(epoch, self.shelley_epoch, self.shelley_epoch_len)
    }

    /// Stability window, 3k/f slots. Slot-to-time translation is only
    /// reliable this far beyond the tip, since a protocol change could
    /// alter slotting after it. 129600 slots (36 hours) on mainnet.
    pub fn stability_window(&self) -> u64 {
        self.security_param * self.active_slots_coeff.denom() / self.active_slots_coeff.numer() * 3
    }

    /// Highest slot whose wall-clock time can be relied on, seen from
    /// `current_slot`
    pub fn max_reliable_slot(&self, current_slot: u64) -> u64 {
        current_slot.saturating_add(self.stability_window())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mainnet_stability_window_is_36_hours() {
        let genesis = GenesisValues::mainnet();
        assert_eq!(genesis.stability_window(), 129_600);
    }

    #[test]
    fn reliable_horizon_is_relative_to_tip() {
        let genesis = GenesisValues::mainnet();
        assert_eq!(genesis.max_reliable_slot(1_000_000), 1_129_600);
    }
}
