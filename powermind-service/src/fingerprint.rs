use powermind_domain::Observation;

fn hash_f64(hasher: &mut blake3::Hasher, v: f64) {
    hasher.update(&v.to_bits().to_le_bytes());
}

/// BLAKE3 digest of a series, hex encoded.
///
/// Covers each observation's timestamp (unix nanos) and exact kWh bits, so
/// two runs share a fingerprint only when they saw bit-identical data.
pub fn series_fingerprint(observations: &[Observation]) -> String {
    let mut h = blake3::Hasher::new();
    h.update(&(observations.len() as u64).to_le_bytes());
    for obs in observations {
        h.update(&obs.ts.unix_timestamp_nanos().to_le_bytes());
        hash_f64(&mut h, obs.actual_kwh);
    }
    h.finalize().to_hex().to_string()
}
