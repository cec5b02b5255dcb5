use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Elementary charge (C)
pub const ELEMENTARY_CHARGE: f64 = 1.602176634e-19;

/// Vacuum permittivity (F/m)
pub const VACUUM_PERMITTIVITY: f64 = 8.8541878128e-12;

/// Atomic mass unit (kg)
pub const ATOMIC_MASS_UNIT: f64 = 1.66053906660e-27;

/// Mass number of an alpha particle, the default projectile.
pub const ALPHA_MASS_NUMBER: f64 = 4.0;

/// Physical constants resolved once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhysicalConstants {
    /// Elementary charge (C).
    pub elementary_charge: f64,
    /// Vacuum permittivity (F/m).
    pub vacuum_permittivity: f64,
    /// k = 1 / (4 pi eps0) (N m^2 / C^2).
    pub coulomb_constant: f64,
    /// Atomic mass unit (kg).
    pub atomic_mass_unit: f64,
    /// Projectile rest mass (kg).
    pub projectile_mass: f64,
}

impl PhysicalConstants {
    /// Builds the constant set for a projectile of the given mass number.
    pub fn for_projectile(mass_number: f64) -> Self {
        let coulomb_constant = 1.0 / (4.0 * PI * VACUUM_PERMITTIVITY);
        Self {
            elementary_charge: ELEMENTARY_CHARGE,
            vacuum_permittivity: VACUUM_PERMITTIVITY,
            coulomb_constant,
            atomic_mass_unit: ATOMIC_MASS_UNIT,
            projectile_mass: mass_number * ATOMIC_MASS_UNIT,
        }
    }

    /// Converts a kinetic energy in MeV to joules.
    #[inline(always)]
    pub fn mev_to_joule(&self, energy_mev: f64) -> f64 {
        energy_mev * 1.0e6 * self.elementary_charge
    }
}

impl Default for PhysicalConstants {
    fn default() -> Self {
        Self::for_projectile(ALPHA_MASS_NUMBER)
    }
}
