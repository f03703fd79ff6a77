use crate::types::{BatteryStatus, PlugState};

pub const ALERT_TITLE: &str = "Charge Complete";

/// Decides when the "unplug now" notification fires.
///
/// The condition is AC power with the level at or above the threshold. By
/// default the alert fires once per crossing and re-arms when the condition
/// clears; with `repeat` it fires on every tick the condition holds.
#[derive(Debug)]
pub struct ChargeAlert {
    threshold_pct: u8,
    repeat: bool,
    armed: bool,
}

impl ChargeAlert {
    pub fn new(threshold_pct: u8, repeat: bool) -> Self {
        Self {
            threshold_pct,
            repeat,
            armed: true,
        }
    }

    pub fn condition(&self, status: &BatteryStatus) -> bool {
        status.plugged == PlugState::Ac && status.percentage >= self.threshold_pct
    }

    /// Feed one status reading; returns true if a notification should go out.
    pub fn update(&mut self, status: &BatteryStatus) -> bool {
        if !self.condition(status) {
            self.armed = true;
            return false;
        }
        if self.repeat {
            return true;
        }
        std::mem::replace(&mut self.armed, false)
    }

    pub fn message(&self) -> String {
        format!("Battery reached {}%", self.threshold_pct)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ChargeStatus;

    fn status(percentage: u8, plugged: PlugState) -> BatteryStatus {
        BatteryStatus {
            percentage,
            temperature: 30.0,
            plugged,
            status: ChargeStatus::Charging,
        }
    }

    #[test]
    fn fires_once_per_crossing() {
        let mut alert = ChargeAlert::new(80, false);
        assert!(!alert.update(&status(79, PlugState::Ac)));
        assert!(alert.update(&status(80, PlugState::Ac)));
        assert!(!alert.update(&status(85, PlugState::Ac)));
        assert!(!alert.update(&status(90, PlugState::Ac)));
    }

    #[test]
    fn rearms_when_condition_clears() {
        let mut alert = ChargeAlert::new(80, false);
        assert!(alert.update(&status(82, PlugState::Ac)));
        assert!(!alert.update(&status(82, PlugState::Unplugged)));
        assert!(alert.update(&status(82, PlugState::Ac)));
    }

    #[test]
    fn only_ac_power_counts() {
        let mut alert = ChargeAlert::new(80, false);
        assert!(!alert.update(&status(95, PlugState::Usb)));
        assert!(!alert.update(&status(95, PlugState::Wireless)));
        assert!(!alert.update(&status(95, PlugState::Unknown)));
    }

    #[test]
    fn repeat_mode_fires_every_tick() {
        let mut alert = ChargeAlert::new(80, true);
        assert!(alert.update(&status(80, PlugState::Ac)));
        assert!(alert.update(&status(81, PlugState::Ac)));
        assert!(!alert.update(&status(70, PlugState::Ac)));
    }

    #[test]
    fn message_names_threshold() {
        assert_eq!(ChargeAlert::new(80, false).message(), "Battery reached 80%");
    }
}
