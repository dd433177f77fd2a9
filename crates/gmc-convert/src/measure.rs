use ndarray::{ArrayD, Zip};

/// Newmark & Hall (1982) conversion from 1.0 s spectral acceleration to PGV.
///
/// The factor is `37.27 * 2.54`, from `SA(f) = 1.65 (2 pi V f) / 386.09` with the
/// 5%-damped velocity amplification of 1.65 and g in in/s^2, converted to cm/s.
/// The added ln-sigma is an average of observed PGV/PSA10 scatter for M >= 5.
#[derive(Debug, Clone, Copy, Default)]
pub struct NewmarkHall1982;

const NH82_LN_SIGMA: f64 = 0.5146578;

impl NewmarkHall1982 {
    /// Natural log of the multiplicative conversion factor.
    pub fn ln_factor() -> f64 {
        (37.27_f64 * 2.54).ln()
    }

    /// Multiplicative factor from SA(1.0) in g to PGV in cm/s.
    pub fn conversion_factor() -> f64 {
        37.27 * 2.54
    }

    /// Logarithmic standard deviation introduced by the conversion.
    pub fn ln_sigma() -> f64 {
        NH82_LN_SIGMA
    }

    /// Converts an ln SA(1.0) mean (ln g) to an ln PGV mean (ln cm/s).
    pub fn psa10_to_pgv_mean(psa10: ArrayD<f64>) -> ArrayD<f64> {
        psa10 + Self::ln_factor()
    }

    /// Combines a model sigma with the conversion sigma.
    pub fn psa10_to_pgv_sigma(sigma: &ArrayD<f64>) -> ArrayD<f64> {
        let mut total = sigma.clone();
        Zip::from(&mut total).for_each(|value| {
            *value = (*value * *value + NH82_LN_SIGMA * NH82_LN_SIGMA).sqrt();
        });
        total
    }

    /// Converts a mean and sigma pair.
    pub fn psa10_to_pgv(psa10: ArrayD<f64>, sigma: &ArrayD<f64>) -> (ArrayD<f64>, ArrayD<f64>) {
        (Self::psa10_to_pgv_mean(psa10), Self::psa10_to_pgv_sigma(sigma))
    }
}

/// Bommer & Alarcón (2006) linear conversion between PGV (cm/s) and SA(0.5) (g).
#[derive(Debug, Clone, Copy, Default)]
pub struct BommerAlarcon2006;

impl BommerAlarcon2006 {
    /// Conversion factor `100 * 9.81 / 20`.
    pub fn vfact() -> f64 {
        1.0 / 20.0 * 100.0 * 9.81
    }

    /// PGV (cm/s, linear) to SA(0.5) (g, linear).
    pub fn pgv_to_psa05(pgv: f64) -> f64 {
        pgv / Self::vfact()
    }

    /// SA(0.5) (g, linear) to PGV (cm/s, linear).
    pub fn psa05_to_pgv(psa05: f64) -> f64 {
        psa05 * Self::vfact()
    }
}
