use rand::SeedableRng;
use rand_pcg::Pcg32;

/// Create the noise generator for one fixture.
/// # Arguments:
/// - `base_seed`: Seed shared by the whole run.
/// - `index`: Position of the fixture in the manifest.
/// # Returns:
/// - `Pcg32`: A generator whose stream depends on both arguments, so
///   reordering or inserting fixtures only changes the affected files.
pub fn fixture_rng(base_seed: u64, index: usize) -> Pcg32 {
    Pcg32::seed_from_u64(base_seed.wrapping_add(index as u64))
}

/// Format a byte count as kibibytes with one decimal, e.g. `46.9 KB`.
pub fn format_size(bytes: u64) -> String {
    format!("{:.1} KB", bytes as f64 / 1024.0)
}
