#![no_std]
//! MP2722 Battery Charger and Power Path Management Library
//!
//! Register-level driver for the MPS MP2722 single-cell Li-ion charger with USB
//! Type-C detection. It configures the charger on start-up, refuses to enable
//! charging before the charge voltage and current are known, and decodes the six
//! status registers into a [`PowerStatus`](mp2722::PowerStatus) snapshot.
//!
//! The bus is any `embedded-hal` 1.0 I2C implementation. Enable the `async`
//! feature for an `embedded-hal-async` flavour of the driver.

/// MP2722 battery charger driver.
pub mod mp2722;

/// Optional log output of the driver.
pub mod logging;

/// Hooks for platforms supplying a default bus and log sink.
pub mod platform;

pub(crate) mod register_device;

pub use mp2722::blocking::Mp2722;
pub use mp2722::{ChargerConfig, ChargerError, PowerStatus, MP2722_I2C_ADDRESS};

#[cfg(feature = "async")]
pub use mp2722::asynch::Mp2722Async;

#[cfg(test)]
mod tests {
    extern crate std;

    use crate::mp2722::{
        BoostFault, CcSinkStatus, CcSourceStatus, ChargerError, ChargerFault, ChargerStatus,
        LegacyInputSrcType, NtcState, WatchdogTimer,
    };
    use std::format;

    #[test]
    fn test_legacy_input_src_type_display() {
        assert_eq!(format!("{}", LegacyInputSrcType::UsbSdp), "USB SDP");
        assert_eq!(format!("{}", LegacyInputSrcType::UsbDcp), "USB DCP");
        assert_eq!(format!("{}", LegacyInputSrcType::Divider5), "Divider 5 (3A)");
        assert_eq!(
            format!("{}", LegacyInputSrcType::HighVoltage),
            "High voltage adapter"
        );
        assert_eq!(format!("{}", LegacyInputSrcType::Unknown), "Unknown");
    }

    #[test]
    fn test_legacy_input_src_type_from() {
        assert_eq!(LegacyInputSrcType::from(0b0000), LegacyInputSrcType::Undefined);
        assert_eq!(LegacyInputSrcType::from(0b0011), LegacyInputSrcType::UsbCdp);
        assert_eq!(LegacyInputSrcType::from(0b1001), LegacyInputSrcType::HighVoltage);
        assert_eq!(LegacyInputSrcType::from(0b1110), LegacyInputSrcType::Divider5);
        assert_eq!(LegacyInputSrcType::from(0b1010), LegacyInputSrcType::Unknown);
        assert_eq!(LegacyInputSrcType::from(0b1111), LegacyInputSrcType::Unknown);
    }

    #[test]
    fn test_charger_status_display() {
        assert_eq!(format!("{}", ChargerStatus::NotCharging), "Not charging");
        assert_eq!(format!("{}", ChargerStatus::FastCharge), "Fast charge");
        assert_eq!(format!("{}", ChargerStatus::ChargeDone), "Charge done");
        assert_eq!(format!("{}", ChargerStatus::Unknown), "Unknown");
    }

    #[test]
    fn test_charger_status_from() {
        assert_eq!(ChargerStatus::from(0), ChargerStatus::NotCharging);
        assert_eq!(ChargerStatus::from(1), ChargerStatus::TrickleCharge);
        assert_eq!(ChargerStatus::from(2), ChargerStatus::PreCharge);
        assert_eq!(ChargerStatus::from(3), ChargerStatus::FastCharge);
        assert_eq!(ChargerStatus::from(4), ChargerStatus::ConstVoltage);
        assert_eq!(ChargerStatus::from(5), ChargerStatus::ChargeDone);
        assert_eq!(ChargerStatus::from(6), ChargerStatus::Unknown);
        assert_eq!(ChargerStatus::from(7), ChargerStatus::Unknown);
    }

    #[test]
    fn test_fault_from() {
        assert_eq!(ChargerFault::from(0), ChargerFault::None);
        assert_eq!(ChargerFault::from(3), ChargerFault::BattOvervolt);
        assert_eq!(BoostFault::from(4), BoostFault::BattLow);
        assert_eq!(BoostFault::from(5), BoostFault::Unknown);
        assert_eq!(format!("{}", ChargerFault::Timeout), "Safety timer expired");
        assert_eq!(format!("{}", BoostFault::Overload), "Overload");
    }

    #[test]
    fn test_ntc_and_cc_from() {
        assert_eq!(NtcState::from(3), NtcState::Cold);
        assert_eq!(NtcState::from(4), NtcState::Hot);
        assert_eq!(NtcState::from(5), NtcState::Unknown);
        assert_eq!(CcSinkStatus::from(2), CcSinkStatus::VRd1A5);
        assert_eq!(CcSourceStatus::from(2), CcSourceStatus::VRa);
        assert_eq!(CcSourceStatus::from(3), CcSourceStatus::Unknown);
        assert_eq!(format!("{}", CcSinkStatus::VRd3A0), "vRd-3.0");
    }

    #[test]
    fn test_watchdog_timer_round_trip() {
        for timer in [
            WatchdogTimer::Disabled,
            WatchdogTimer::Sec40,
            WatchdogTimer::Sec80,
            WatchdogTimer::Sec160,
        ] {
            assert_eq!(WatchdogTimer::from(u8::from(timer)), timer);
        }
        assert_eq!(format!("{}", WatchdogTimer::Sec40), "40 s");
    }

    #[test]
    fn test_error_display() {
        assert_eq!(format!("{}", ChargerError::Fail), "I2C transaction failed");
        assert_eq!(format!("{}", ChargerError::InvalidState), "Invalid state");
    }
}
