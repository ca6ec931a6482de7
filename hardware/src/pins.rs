use bricks_common::{GpioPort, HardwareError, Level, PinNumbering};

// Physical 40-pin header position -> BCM line, for boards from revision 2 on.
const BOARD_TO_BCM: [(u32, u32); 28] = [
    (3, 2),
    (5, 3),
    (7, 4),
    (8, 14),
    (10, 15),
    (11, 17),
    (12, 18),
    (13, 27),
    (15, 22),
    (16, 23),
    (18, 24),
    (19, 10),
    (21, 9),
    (22, 25),
    (23, 11),
    (24, 8),
    (26, 7),
    (27, 0),
    (28, 1),
    (29, 5),
    (31, 6),
    (32, 12),
    (33, 13),
    (35, 19),
    (36, 16),
    (37, 26),
    (38, 20),
    (40, 21),
];

pub fn board_to_bcm(pin: u32) -> Option<u32> {
    BOARD_TO_BCM
        .iter()
        .find(|(board, _)| *board == pin)
        .map(|(_, bcm)| *bcm)
}

/// Translates configured line numbers into BCM lines before handing them to
/// the wrapped backend.
#[derive(Debug)]
pub struct PinMap<G> {
    inner: G,
    numbering: PinNumbering,
}

impl<G> PinMap<G> {
    pub fn new(inner: G, numbering: PinNumbering) -> Self {
        Self { inner, numbering }
    }

    pub fn inner(&self) -> &G {
        &self.inner
    }

    fn resolve(&self, line: u32) -> Result<u32, HardwareError> {
        match self.numbering {
            PinNumbering::Bcm => Ok(line),
            PinNumbering::Board => board_to_bcm(line).ok_or_else(|| HardwareError::InvalidLine {
                line,
                reason: "header pin is not a gpio (power, ground or out of range)".to_string(),
            }),
        }
    }
}

impl<G: GpioPort> GpioPort for PinMap<G> {
    fn configure_output(&mut self, line: u32) -> Result<(), HardwareError> {
        let bcm = self.resolve(line)?;
        self.inner.configure_output(bcm)
    }

    fn write_line(&mut self, line: u32, level: Level) -> Result<(), HardwareError> {
        let bcm = self.resolve(line)?;
        self.inner.write_line(bcm, level)
    }
}
