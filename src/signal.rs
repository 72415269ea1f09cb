//! Distance-dependent bitrate for the wireless link.
//!
//! A log-distance path-loss model feeds a Shannon-capacity bitrate, scaled
//! so capacity at the 1 m reference distance lands exactly on the link's
//! nominal rate. Unlike a LoRa airtime model with log-normal shadowing,
//! this is fully deterministic: the same distance always yields the same
//! bitrate, which the simulator's determinism guarantee depends on.

/// Parameters of the Bluetooth-LE-like physical layer.
#[derive(Debug, Clone, Copy)]
pub struct LinkBudget {
    /// Path loss (dB) at the 1 m reference distance.
    pub path_loss_at_reference: f64,
    /// Path-loss exponent (2.0 = free space).
    pub path_loss_exponent: f64,
    /// Channel bandwidth in Hz.
    pub bandwidth_hz: f64,
    /// Transmit power in dBm.
    pub tx_power_dbm: f64,
    /// Noise floor in dBm.
    pub noise_floor_dbm: f64,
    /// Nominal link rate (bps) the 1 m capacity is scaled to match.
    pub nominal_rate_bps: f64,
}

impl Default for LinkBudget {
    fn default() -> Self {
        Self {
            path_loss_at_reference: 40.0,
            path_loss_exponent: 2.0,
            bandwidth_hz: 1_000_000.0,
            tx_power_dbm: 0.0,
            noise_floor_dbm: -85.0,
            nominal_rate_bps: 1_000_000.0,
        }
    }
}

impl LinkBudget {
    fn path_loss_db(&self, distance_m: f64) -> f64 {
        self.path_loss_at_reference + 10.0 * self.path_loss_exponent * distance_m.log10()
    }

    fn shannon_capacity(&self, distance_m: f64) -> f64 {
        let received_dbm = self.tx_power_dbm - self.path_loss_db(distance_m);
        let snr_db = received_dbm - self.noise_floor_dbm;
        let snr = 10f64.powf(snr_db / 10.0);
        self.bandwidth_hz * (1.0 + snr).log2()
    }

    /// Bitrate (bps) at `distance_m` for a link with transmit range `range_m`.
    ///
    /// Distances below 1 m clamp up to 1 m. At or beyond `range_m` the rate
    /// is 0 (range is a strict upper bound). Capacity is scaled so the 1 m
    /// value equals `nominal_rate_bps` exactly, then clamped to that value
    /// (closer than 1 m never reports a faster-than-nominal rate).
    pub fn bitrate_bps(&self, distance_m: f64, range_m: f64) -> f64 {
        if distance_m >= range_m {
            return 0.0;
        }
        let clamped_distance = distance_m.max(1.0);
        let capacity_at_reference = self.shannon_capacity(1.0);
        let scale = self.nominal_rate_bps / capacity_at_reference;
        let capacity = self.shannon_capacity(clamped_distance) * scale;
        capacity.min(self.nominal_rate_bps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bitrate_at_reference_distance_is_nominal() {
        let lb = LinkBudget::default();
        let rate = lb.bitrate_bps(1.0, 20.0);
        assert!((rate - lb.nominal_rate_bps).abs() < 1.0);
    }

    #[test]
    fn bitrate_clamps_for_sub_reference_distance() {
        let lb = LinkBudget::default();
        let at_half_meter = lb.bitrate_bps(0.5, 20.0);
        let at_reference = lb.bitrate_bps(1.0, 20.0);
        assert_eq!(at_half_meter, at_reference);
    }

    #[test]
    fn bitrate_is_zero_at_or_beyond_range() {
        let lb = LinkBudget::default();
        assert_eq!(lb.bitrate_bps(20.0, 20.0), 0.0);
        assert_eq!(lb.bitrate_bps(25.0, 20.0), 0.0);
    }

    #[test]
    fn bitrate_decreases_with_distance() {
        let lb = LinkBudget::default();
        let near = lb.bitrate_bps(2.0, 20.0);
        let far = lb.bitrate_bps(15.0, 20.0);
        assert!(near > far);
    }

    #[test]
    fn bitrate_is_deterministic() {
        let lb = LinkBudget::default();
        assert_eq!(lb.bitrate_bps(5.0, 20.0), lb.bitrate_bps(5.0, 20.0));
    }
}
