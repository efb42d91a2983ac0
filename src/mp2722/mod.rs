use core::fmt::{self, Display, Formatter};
use embedded_hal::i2c::Error;
use num_enum::{FromPrimitive, IntoPrimitive};

use crate::logging::Logger;
use regs::*;

pub(crate) mod regs;

pub mod blocking;

#[cfg(feature = "async")]
pub mod asynch;

#[cfg(test)]
pub(crate) mod test_support;

/// Default 7-bit I2C address of the MP2722
pub const MP2722_I2C_ADDRESS: u8 = 0x3F;

/// Errors that can occur when interacting with the MP2722
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChargerError {
    /// The bus transaction failed
    Fail,
    /// Reserved, the driver clamps out-of-range arguments instead of rejecting them
    InvalidArg,
    /// Called before `init()` succeeded, charging requested before voltage and
    /// current were set, or no bus is bound
    InvalidState,
    /// Reserved for bus implementations reporting timeouts
    Timeout,
    /// Reserved for bus implementations reporting a missing device
    NotFound,
}

impl<E> From<E> for ChargerError
where
    E: Error,
{
    fn from(_: E) -> Self {
        ChargerError::Fail
    }
}

impl Display for ChargerError {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            ChargerError::Fail => write!(f, "I2C transaction failed"),
            ChargerError::InvalidArg => write!(f, "Invalid argument"),
            ChargerError::InvalidState => write!(f, "Invalid state"),
            ChargerError::Timeout => write!(f, "Timeout"),
            ChargerError::NotFound => write!(f, "Device not found"),
        }
    }
}

/// Input source found by D+/D- detection, with the input limit the device picks for it
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive, IntoPrimitive)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum LegacyInputSrcType {
    /// 500mA
    Undefined = 0b0000,
    /// 500mA, also reported for reserved codes
    #[num_enum(default)]
    Unknown = 0b1000,
    /// 500mA
    UsbSdp = 0b0001,
    /// 2A
    UsbDcp = 0b0010,
    /// 1.5A
    UsbCdp = 0b0011,
    /// 1A
    Divider1 = 0b0100,
    /// 2.1A
    Divider2 = 0b0101,
    /// 2.4A
    Divider3 = 0b0110,
    /// 2A
    Divider4 = 0b0111,
    /// 3A
    Divider5 = 0b1110,
    /// 2A
    HighVoltage = 0b1001,
}

impl Display for LegacyInputSrcType {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            LegacyInputSrcType::Undefined => write!(f, "Undefined"),
            LegacyInputSrcType::Unknown => write!(f, "Unknown"),
            LegacyInputSrcType::UsbSdp => write!(f, "USB SDP"),
            LegacyInputSrcType::UsbDcp => write!(f, "USB DCP"),
            LegacyInputSrcType::UsbCdp => write!(f, "USB CDP"),
            LegacyInputSrcType::Divider1 => write!(f, "Divider 1 (1A)"),
            LegacyInputSrcType::Divider2 => write!(f, "Divider 2 (2.1A)"),
            LegacyInputSrcType::Divider3 => write!(f, "Divider 3 (2.4A)"),
            LegacyInputSrcType::Divider4 => write!(f, "Divider 4 (2A)"),
            LegacyInputSrcType::Divider5 => write!(f, "Divider 5 (3A)"),
            LegacyInputSrcType::HighVoltage => write!(f, "High voltage adapter"),
        }
    }
}

/// Charge phase (CHG_STAT)
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive, IntoPrimitive)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum ChargerStatus {
    /// Terminated or stopped by a fault
    NotCharging = 0b000,
    /// Deeply discharged battery, small current
    TrickleCharge = 0b001,
    PreCharge = 0b010,
    /// Full configured charge current
    FastCharge = 0b011,
    /// Holding the battery at the charge voltage while current tapers off
    ConstVoltage = 0b100,
    /// Battery full with input still present, recharges below the recharge threshold
    ChargeDone = 0b101,
    #[num_enum(default)]
    Unknown = 0xFF,
}

impl Display for ChargerStatus {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            ChargerStatus::NotCharging => write!(f, "Not charging"),
            ChargerStatus::TrickleCharge => write!(f, "Trickle charge"),
            ChargerStatus::PreCharge => write!(f, "Pre-charge"),
            ChargerStatus::FastCharge => write!(f, "Fast charge"),
            ChargerStatus::ConstVoltage => write!(f, "Constant voltage"),
            ChargerStatus::ChargeDone => write!(f, "Charge done"),
            ChargerStatus::Unknown => write!(f, "Unknown"),
        }
    }
}

/// Charger fault (CHG_FAULT)
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoPrimitive)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum ChargerFault {
    None = 0b00,
    /// Input above the OVP threshold, latches off
    InputOvervolt = 0b01,
    /// Charge safety timer expired, latches off
    Timeout = 0b10,
    /// Battery above the OVP threshold, latches off
    BattOvervolt = 0b11,
}

impl ChargerFault {
    /// Latch-off faults stay until the device is reset
    pub fn is_latched(&self) -> bool {
        !matches!(self, ChargerFault::None)
    }
}

impl From<u8> for ChargerFault {
    fn from(val: u8) -> Self {
        match val & 0b11 {
            0b00 => ChargerFault::None,
            0b01 => ChargerFault::InputOvervolt,
            0b10 => ChargerFault::Timeout,
            _ => ChargerFault::BattOvervolt,
        }
    }
}

impl Display for ChargerFault {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            ChargerFault::None => write!(f, "Normal"),
            ChargerFault::InputOvervolt => write!(f, "Input OVP"),
            ChargerFault::Timeout => write!(f, "Safety timer expired"),
            ChargerFault::BattOvervolt => write!(f, "Battery OVP"),
        }
    }
}

/// Boost (OTG) fault (BOOST_FAULT)
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive, IntoPrimitive)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum BoostFault {
    None = 0b000,
    /// Overload or short on IN, latches off
    Overload = 0b001,
    /// Output overvoltage, recovers on its own
    Overvolt = 0b010,
    /// Die overtemperature, latches off
    Overtemp = 0b011,
    /// Battery below the boost cutoff, latches off
    BattLow = 0b100,
    #[num_enum(default)]
    Unknown = 0xFF,
}

impl BoostFault {
    /// Latch-off faults stay until the device is reset
    pub fn is_latched(&self) -> bool {
        matches!(
            self,
            BoostFault::Overload | BoostFault::Overtemp | BoostFault::BattLow
        )
    }
}

impl Display for BoostFault {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            BoostFault::None => write!(f, "Normal"),
            BoostFault::Overload => write!(f, "Overload"),
            BoostFault::Overvolt => write!(f, "Overvoltage"),
            BoostFault::Overtemp => write!(f, "Overtemperature"),
            BoostFault::BattLow => write!(f, "Battery low"),
            BoostFault::Unknown => write!(f, "Unknown"),
        }
    }
}

/// JEITA temperature zone reported for an NTC input
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive, IntoPrimitive)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum NtcState {
    Normal = 0b000,
    Warm = 0b001,
    Cool = 0b010,
    Cold = 0b011,
    Hot = 0b100,
    #[num_enum(default)]
    Unknown = 0xFF,
}

impl Display for NtcState {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            NtcState::Normal => write!(f, "Normal"),
            NtcState::Warm => write!(f, "Warm"),
            NtcState::Cool => write!(f, "Cool"),
            NtcState::Cold => write!(f, "Cold"),
            NtcState::Hot => write!(f, "Hot"),
            NtcState::Unknown => write!(f, "Unknown"),
        }
    }
}

/// USB Type-C CC pin state while acting as a sink
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoPrimitive)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum CcSinkStatus {
    VRa = 0b00,
    VRdUsb = 0b01,
    VRd1A5 = 0b10,
    VRd3A0 = 0b11,
}

impl From<u8> for CcSinkStatus {
    fn from(val: u8) -> Self {
        match val & 0b11 {
            0b00 => CcSinkStatus::VRa,
            0b01 => CcSinkStatus::VRdUsb,
            0b10 => CcSinkStatus::VRd1A5,
            _ => CcSinkStatus::VRd3A0,
        }
    }
}

impl Display for CcSinkStatus {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            CcSinkStatus::VRa => write!(f, "vRa"),
            CcSinkStatus::VRdUsb => write!(f, "vRd-USB"),
            CcSinkStatus::VRd1A5 => write!(f, "vRd-1.5"),
            CcSinkStatus::VRd3A0 => write!(f, "vRd-3.0"),
        }
    }
}

/// USB Type-C CC pin state while acting as a source
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive, IntoPrimitive)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum CcSourceStatus {
    VOpen = 0b00,
    VRd = 0b01,
    VRa = 0b10,
    #[num_enum(default)]
    Unknown = 0xFF,
}

impl Display for CcSourceStatus {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            CcSourceStatus::VOpen => write!(f, "vOPEN"),
            CcSourceStatus::VRd => write!(f, "vRd"),
            CcSourceStatus::VRa => write!(f, "vRa"),
            CcSourceStatus::Unknown => write!(f, "Unknown"),
        }
    }
}

/// I2C watchdog period. When it expires every register returns to its power-on default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoPrimitive)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum WatchdogTimer {
    Disabled = 0b00,
    Sec40 = 0b01,
    Sec80 = 0b10,
    Sec160 = 0b11,
}

impl From<u8> for WatchdogTimer {
    fn from(val: u8) -> Self {
        match val & 0b11 {
            0b00 => WatchdogTimer::Disabled,
            0b01 => WatchdogTimer::Sec40,
            0b10 => WatchdogTimer::Sec80,
            _ => WatchdogTimer::Sec160,
        }
    }
}

impl Display for WatchdogTimer {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            WatchdogTimer::Disabled => write!(f, "Disabled"),
            WatchdogTimer::Sec40 => write!(f, "40 s"),
            WatchdogTimer::Sec80 => write!(f, "80 s"),
            WatchdogTimer::Sec160 => write!(f, "160 s"),
        }
    }
}

/// Snapshot of the six status registers (0x11..=0x16) taken by one burst read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PowerStatus {
    /// D+/D- detection result
    pub legacy_src_type: LegacyInputSrcType,
    /// Legacy cable detected (not valid in DRP mode)
    pub legacy_cable: bool,
    /// Input source valid
    pub vin_good: bool,
    /// Input source detection complete
    pub vin_ready: bool,
    /// `vin_good && vin_ready`
    pub charger_ready: bool,
    /// VBATT above VSYS_MIN
    pub vsys_regulation: bool,
    /// Die temperature loop active and throttling
    pub thermal_regulation: bool,
    /// Throttling on a weak input (VINDPM or IINDPM)
    pub input_dpm_regulation: bool,
    pub fault_watchdog: bool,
    pub charger_status: ChargerStatus,
    pub charger_fault: ChargerFault,
    pub boost_fault: BoostFault,

    /// Possible connection fault at the battery input
    pub fault_battery: bool,
    /// Possible connection fault at the NTC input(s)
    pub fault_ntc: bool,
    pub ntc1_state: NtcState,
    pub ntc2_state: NtcState,

    pub cc1_snk_stat: CcSinkStatus,
    pub cc2_snk_stat: CcSinkStatus,
    pub cc1_src_stat: CcSourceStatus,
    pub cc2_src_stat: CcSourceStatus,

    /// Top-off timer counting
    pub topoff_active: bool,
    /// Battery is powering the system
    pub bfet_stat: bool,
    /// VBATT below BATT_LOW
    pub batt_low_stat: bool,
    /// Boost requested by OTG detection
    pub otg_need: bool,
    pub vin_test_high: bool,
    pub debug_acc: bool,
    pub audio_acc: bool,
}

impl PowerStatus {
    /// Decodes registers 0x11..=0x16, in that order
    pub fn from_registers(regs: &[u8; STATUS_LEN]) -> Self {
        let base = REG_STATUS11;
        let bit = |field: Field| field.is_set_in(base, regs);
        let value = |field: Field| field.decode_from(base, regs);

        let vin_good = bit(VIN_GD);
        let vin_ready = bit(VIN_RDY);

        Self {
            legacy_src_type: LegacyInputSrcType::from(value(DPDM_STAT)),
            input_dpm_regulation: bit(VINDPM_STAT) || bit(IINDPM_STAT),

            vin_good,
            vin_ready,
            charger_ready: vin_good && vin_ready,
            vsys_regulation: bit(VSYS_STAT),
            thermal_regulation: bit(THERM_STAT),
            legacy_cable: bit(LEGACYCABLE),
            fault_watchdog: bit(WATCHDOG_FAULT),

            charger_status: ChargerStatus::from(value(CHG_STAT)),
            charger_fault: ChargerFault::from(value(CHG_FAULT)),
            boost_fault: BoostFault::from(value(BOOST_FAULT)),

            fault_battery: bit(BATT_MISSING),
            fault_ntc: bit(NTC_MISSING),
            ntc1_state: NtcState::from(value(NTC1_FAULT)),
            ntc2_state: NtcState::from(value(NTC2_FAULT)),

            cc1_snk_stat: CcSinkStatus::from(value(CC1_SNK_STAT)),
            cc2_snk_stat: CcSinkStatus::from(value(CC2_SNK_STAT)),
            cc1_src_stat: CcSourceStatus::from(value(CC1_SRC_STAT)),
            cc2_src_stat: CcSourceStatus::from(value(CC2_SRC_STAT)),

            topoff_active: bit(TOPOFF_ACTIVE),
            bfet_stat: bit(BFET_STAT),
            batt_low_stat: bit(BATT_LOW_STAT),
            otg_need: bit(OTG_NEED),
            vin_test_high: bit(VIN_TEST_HIGH),
            debug_acc: bit(DEBUGACC),
            audio_acc: bit(AUDIOACC),
        }
    }
}

impl Display for PowerStatus {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        writeln!(f, "Input source: {}", self.legacy_src_type)?;
        writeln!(f, "Charger ready: {}", self.charger_ready)?;
        writeln!(f, "CHG state: {}", self.charger_status)?;
        writeln!(f, "CHG fault: {}", self.charger_fault)?;
        writeln!(f, "Boost fault: {}", self.boost_fault)?;
        writeln!(f, "NTC1: {}, NTC2: {}", self.ntc1_state, self.ntc2_state)?;
        writeln!(
            f,
            "CC sink: {}/{}, CC source: {}/{}",
            self.cc1_snk_stat, self.cc2_snk_stat, self.cc1_src_stat, self.cc2_src_stat
        )?;
        writeln!(f, "Thermal regulation: {}", self.thermal_regulation)?;
        writeln!(f, "Input DPM: {}", self.input_dpm_regulation)?;
        writeln!(f, "Watchdog fault: {}", self.fault_watchdog)?;
        write!(f, "Battery low: {}", self.batt_low_stat)
    }
}

/// Charging parameters applied in one go by `apply_config`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChargerConfig {
    /// Battery regulation voltage in mV (3600-4600)
    pub charge_voltage_mv: u16,
    /// Fast charge current in mA (80-5000)
    pub charge_current_ma: u16,
    /// Input current limit in mA (100-3200)
    pub input_current_limit_ma: u16,
    pub watchdog: WatchdogTimer,
    /// Turn charging on once the limits above are in place
    pub enable_charging: bool,
}

impl Default for ChargerConfig {
    fn default() -> Self {
        Self {
            charge_voltage_mv: 4200,
            charge_current_ma: 1000,
            input_current_limit_ma: 500,
            watchdog: WatchdogTimer::Sec40,
            enable_charging: false,
        }
    }
}

/// Controller bookkeeping shared by the blocking and async drivers
#[derive(Debug, Default)]
pub(crate) struct ChargerState {
    pub initialized: bool,
    pub charge_voltage_configured: bool,
    pub charge_current_configured: bool,
    pub logger: Logger,
}

impl ChargerState {
    pub fn require_initialized(&self) -> Result<(), ChargerError> {
        if self.initialized {
            Ok(())
        } else {
            self.logger
                .error(format_args!("init() must be called first"));
            Err(ChargerError::InvalidState)
        }
    }

    pub fn is_safe_to_charge(&self) -> bool {
        self.charge_voltage_configured && self.charge_current_configured
    }

    /// Charging may only be turned on once both limits were applied successfully
    pub fn require_charge_allowed(&self, enable: bool) -> Result<(), ChargerError> {
        self.require_initialized()?;
        if enable && !self.is_safe_to_charge() {
            self.logger.error(format_args!(
                "Charge voltage and current must be set before enabling charging"
            ));
            return Err(ChargerError::InvalidState);
        }
        Ok(())
    }

    /// Device registers are back at power-on defaults
    pub fn forget_configuration(&mut self) {
        self.initialized = false;
        self.charge_voltage_configured = false;
        self.charge_current_configured = false;
    }
}
