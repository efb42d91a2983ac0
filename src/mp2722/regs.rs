//! MP2722 register map.
//!
//! Every configuration attribute and status field lives in one 8-bit register as a
//! mask + shift pair. Setters, read-back getters and the status decoder all go through
//! the [`Field`] entries below, so a bit position is written down exactly once.

pub(crate) const REG_CONFIG0: u8 = 0x00;
pub(crate) const REG_CONFIG1: u8 = 0x01;
pub(crate) const REG_CONFIG2: u8 = 0x02;
pub(crate) const REG_CONFIG5: u8 = 0x05;
pub(crate) const REG_CONFIG7: u8 = 0x07;
pub(crate) const REG_CONFIG8: u8 = 0x08;
pub(crate) const REG_CONFIG9: u8 = 0x09;
pub(crate) const REG_CONFIGA: u8 = 0x0A;
pub(crate) const REG_CONFIGC: u8 = 0x0C;

/// First of the six consecutive status registers (0x11..=0x16)
pub(crate) const REG_STATUS11: u8 = 0x11;
pub(crate) const REG_STATUS12: u8 = 0x12;
pub(crate) const REG_STATUS13: u8 = 0x13;
pub(crate) const REG_STATUS14: u8 = 0x14;
pub(crate) const REG_STATUS15: u8 = 0x15;
pub(crate) const REG_STATUS16: u8 = 0x16;

/// Number of status registers fetched by one burst read
pub(crate) const STATUS_LEN: usize = 6;

/// Register probed by `init()` to verify the device answers
pub(crate) const REG_PROBE: u8 = REG_CONFIG0;

/// A bit-aligned sub-field of one register
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Field {
    pub reg: u8,
    pub mask: u8,
    pub shift: u8,
}

impl Field {
    pub const fn new(reg: u8, mask: u8, shift: u8) -> Self {
        Self { reg, mask, shift }
    }

    /// Single-bit field
    pub const fn bit(reg: u8, bit: u8) -> Self {
        Self::new(reg, 1 << bit, bit)
    }

    /// Largest value the field can hold
    pub const fn max(&self) -> u8 {
        self.mask >> self.shift
    }

    /// Moves `value` into position, dropping anything wider than the field
    pub const fn encode(&self, value: u8) -> u8 {
        (value << self.shift) & self.mask
    }

    /// Register value with this field set (or cleared) for a boolean control
    pub const fn flag(&self, enable: bool) -> u8 {
        if enable {
            self.mask
        } else {
            0
        }
    }

    pub const fn decode(&self, raw: u8) -> u8 {
        (raw & self.mask) >> self.shift
    }

    pub const fn is_set(&self, raw: u8) -> bool {
        raw & self.mask != 0
    }

    /// Picks this field's register out of a status burst that started at `base`
    pub fn decode_from(&self, base: u8, regs: &[u8; STATUS_LEN]) -> u8 {
        self.decode(regs[self.burst_index(base)])
    }

    pub fn is_set_in(&self, base: u8, regs: &[u8; STATUS_LEN]) -> bool {
        self.is_set(regs[self.burst_index(base)])
    }

    fn burst_index(&self, base: u8) -> usize {
        debug_assert!(
            self.reg >= base && usize::from(self.reg - base) < STATUS_LEN,
            "register 0x{:02X} is not part of the status burst at 0x{:02X}",
            self.reg,
            base
        );
        usize::from(self.reg.wrapping_sub(base))
    }
}

// CONFIG0
pub(crate) const REG_RST: Field = Field::bit(REG_CONFIG0, 7);
pub(crate) const EN_STAT_IB: Field = Field::bit(REG_CONFIG0, 6);

// CONFIG1
pub(crate) const IIN_MODE: Field = Field::new(REG_CONFIG1, 0xE0, 5);
pub(crate) const IIN_LIM: Field = Field::new(REG_CONFIG1, 0x1F, 0);

// CONFIG2
pub(crate) const ICC: Field = Field::new(REG_CONFIG2, 0x3F, 0);

// CONFIG5
pub(crate) const VBATT_REG: Field = Field::new(REG_CONFIG5, 0x7E, 1);

// CONFIG7
pub(crate) const IB_EN: Field = Field::bit(REG_CONFIG7, 7);
pub(crate) const WATCHDOG: Field = Field::new(REG_CONFIG7, 0x30, 4);
pub(crate) const WATCHDOG_RST: Field = Field::bit(REG_CONFIG7, 3);

// CONFIG8
pub(crate) const BATTFET_DIS: Field = Field::bit(REG_CONFIG8, 5);

// CONFIG9
pub(crate) const AUTOOTG: Field = Field::bit(REG_CONFIG9, 7);
pub(crate) const EN_BOOST: Field = Field::bit(REG_CONFIG9, 6);
pub(crate) const EN_BUCK: Field = Field::bit(REG_CONFIG9, 5);
pub(crate) const EN_CHG: Field = Field::bit(REG_CONFIG9, 4);

// CONFIGA
pub(crate) const FORCEDPDM: Field = Field::bit(REG_CONFIGA, 7);
pub(crate) const AUTODPDM: Field = Field::bit(REG_CONFIGA, 6);

// CONFIGC
pub(crate) const BOOST_STP_EN: Field = Field::bit(REG_CONFIGC, 7);

// STATUS11: D+/D- detection and DPM loops
pub(crate) const DPDM_STAT: Field = Field::new(REG_STATUS11, 0xF0, 4);
pub(crate) const VINDPM_STAT: Field = Field::bit(REG_STATUS11, 1);
pub(crate) const IINDPM_STAT: Field = Field::bit(REG_STATUS11, 0);

// STATUS12: power, thermal and watchdog
pub(crate) const VIN_GD: Field = Field::bit(REG_STATUS12, 7);
pub(crate) const VIN_RDY: Field = Field::bit(REG_STATUS12, 6);
pub(crate) const LEGACYCABLE: Field = Field::bit(REG_STATUS12, 5);
pub(crate) const THERM_STAT: Field = Field::bit(REG_STATUS12, 4);
pub(crate) const VSYS_STAT: Field = Field::bit(REG_STATUS12, 3);
pub(crate) const WATCHDOG_FAULT: Field = Field::bit(REG_STATUS12, 2);

// STATUS13: charger and boost
pub(crate) const CHG_STAT: Field = Field::new(REG_STATUS13, 0xE0, 5);
pub(crate) const BOOST_FAULT: Field = Field::new(REG_STATUS13, 0x1C, 2);
pub(crate) const CHG_FAULT: Field = Field::new(REG_STATUS13, 0x03, 0);

// STATUS14: physical faults and JEITA zones
pub(crate) const BATT_MISSING: Field = Field::bit(REG_STATUS14, 7);
pub(crate) const NTC_MISSING: Field = Field::bit(REG_STATUS14, 6);
pub(crate) const NTC1_FAULT: Field = Field::new(REG_STATUS14, 0x38, 3);
pub(crate) const NTC2_FAULT: Field = Field::new(REG_STATUS14, 0x07, 0);

// STATUS15: USB Type-C CC detection
pub(crate) const CC1_SNK_STAT: Field = Field::new(REG_STATUS15, 0xC0, 6);
pub(crate) const CC2_SNK_STAT: Field = Field::new(REG_STATUS15, 0x30, 4);
pub(crate) const CC1_SRC_STAT: Field = Field::new(REG_STATUS15, 0x0C, 2);
pub(crate) const CC2_SRC_STAT: Field = Field::new(REG_STATUS15, 0x03, 0);

// STATUS16: misc
pub(crate) const TOPOFF_ACTIVE: Field = Field::bit(REG_STATUS16, 7);
pub(crate) const BFET_STAT: Field = Field::bit(REG_STATUS16, 6);
pub(crate) const BATT_LOW_STAT: Field = Field::bit(REG_STATUS16, 5);
pub(crate) const OTG_NEED: Field = Field::bit(REG_STATUS16, 4);
pub(crate) const VIN_TEST_HIGH: Field = Field::bit(REG_STATUS16, 3);
pub(crate) const DEBUGACC: Field = Field::bit(REG_STATUS16, 1);
pub(crate) const AUDIOACC: Field = Field::bit(REG_STATUS16, 0);

/// IIN_MODE value that makes the device follow IIN_LIM
pub(crate) const IIN_MODE_FOLLOW_IIN_LIM: u8 = 0b000;

/// Linear mapping between a physical quantity and a register field
#[derive(Debug, Clone, Copy)]
pub(crate) struct Scale {
    pub field: Field,
    pub min: u16,
    pub max: u16,
    pub base: u16,
    pub step: u16,
}

impl Scale {
    pub fn clamp(&self, value: u16) -> u16 {
        value.clamp(self.min, self.max)
    }

    /// Clamps `value` to the hardware range and converts it to a step count.
    ///
    /// Integer division truncates, so requests between two steps land on the lower one.
    pub fn steps(&self, value: u16) -> u8 {
        let steps = (self.clamp(value) - self.base) / self.step;
        steps.min(self.field.max() as u16) as u8
    }

    /// Register bits for `value`, already shifted into position
    pub fn encode(&self, value: u16) -> u8 {
        self.field.encode(self.steps(value))
    }

    /// Physical value a register currently holds
    pub fn decode(&self, raw: u8) -> u16 {
        self.base + self.field.decode(raw) as u16 * self.step
    }
}

/// Charge current (ICC): 80-5000 mA
pub(crate) const ICC_SCALE: Scale = Scale {
    field: ICC,
    min: 80,
    max: 5000,
    base: 0,
    step: 80,
};

/// Charge voltage (VBATT_REG): 3600-4600 mV
pub(crate) const VBATT_REG_SCALE: Scale = Scale {
    field: VBATT_REG,
    min: 3600,
    max: 4600,
    base: 3600,
    step: 20,
};

/// Input current limit (IIN_LIM): 100-3200 mA
pub(crate) const IIN_LIM_SCALE: Scale = Scale {
    field: IIN_LIM,
    min: 100,
    max: 3200,
    base: 100,
    step: 100,
};

/// One read-modify-write performed by `init()` after the probe
#[derive(Debug, Clone, Copy)]
pub(crate) struct InitStep {
    pub field: Field,
    pub value: u8,
    pub failure: &'static str,
}

/// Power-up configuration, applied in order. Any failure aborts the sequence.
pub(crate) const INIT_SEQUENCE: [InitStep; 6] = [
    // Non-zero IIN_MODE pins a fixed limit and ignores IIN_LIM
    InitStep {
        field: IIN_MODE,
        value: IIN_MODE.encode(IIN_MODE_FOLLOW_IIN_LIM),
        failure: "Failed to set IIN_MODE to follow IIN_LIM",
    },
    // Charging stays off until voltage and current are set for the actual battery
    InitStep {
        field: EN_CHG,
        value: EN_CHG.flag(false),
        failure: "Failed to disable charging",
    },
    InitStep {
        field: AUTODPDM,
        value: AUTODPDM.flag(true),
        failure: "Failed to enable automatic D+/D- detection",
    },
    InitStep {
        field: EN_BUCK,
        value: EN_BUCK.flag(true),
        failure: "Failed to enable buck converter",
    },
    InitStep {
        field: AUTOOTG,
        value: AUTOOTG.flag(true),
        failure: "Failed to enable auto OTG",
    },
    InitStep {
        field: BOOST_STP_EN,
        value: BOOST_STP_EN.flag(true),
        failure: "Failed to enable boost stop on battery low",
    },
];
