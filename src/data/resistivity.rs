use log::info;
use ndarray::{Array2, Zip};

/// Marker stored where resistivity is physically undefined.
pub const UNDEFINED: f64 = f64::NAN;

/// Outcome of one resistivity derivation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResistivityReport {
    /// Elements masked because their level reached the threshold.
    pub undefined: usize,
    /// Elements in the grid.
    pub total: usize,
}

/// Computes `resistance / (threshold - level)` element-wise.
///
/// Levels at or above the threshold are masked before dividing and yield
/// [`UNDEFINED`]; the division is never attempted for them, so the output can
/// only contain an infinity if the inputs already did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResistivityCalculator {
    threshold: f64,
}

impl ResistivityCalculator {
    /// `threshold` is the rig's full-scale level in mm. Must be finite and > 0.
    pub fn new(threshold: f64) -> Option<Self> {
        (threshold.is_finite() && threshold > 0.0).then_some(Self { threshold })
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Value for a single `(resistance, level)` pair.
    pub fn resistivity(&self, resistance: f64, level: f64) -> f64 {
        if level >= self.threshold {
            UNDEFINED
        } else {
            resistance / (self.threshold - level)
        }
    }

    /// Derive a full grid.
    ///
    /// Returns `None` when `level` and `resistance` differ in shape.
    pub fn apply(
        &self,
        level: &Array2<f64>,
        resistance: &Array2<f64>,
    ) -> Option<(Array2<f64>, ResistivityReport)> {
        if level.dim() != resistance.dim() {
            return None;
        }
        let mut out = Array2::from_elem(level.raw_dim(), UNDEFINED);
        let mut undefined = 0;
        Zip::from(&mut out)
            .and(resistance)
            .and(level)
            .for_each(|rho, &r, &l| {
                if l >= self.threshold {
                    undefined += 1;
                }
                *rho = self.resistivity(r, l);
            });

        let report = ResistivityReport {
            undefined,
            total: out.len(),
        };
        if undefined > 0 {
            info!(
                "{undefined} of {} resistivity values undefined (level >= {} mm)",
                report.total, self.threshold
            );
        }
        Some((out, report))
    }
}
