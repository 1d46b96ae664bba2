/// Derive an entry identifier from a filename by stripping its final
/// extension.
///
/// The name is split on `.` and every segment except the last is joined back
/// together, so `alice.yaml` becomes `alice` and `alice.smith.yaml` becomes
/// `alice.smith`. A name without any `.` has no extension to strip and is
/// returned unchanged.
pub fn id_from_filename(name: &str) -> &str {
    match name.rfind('.') {
        Some(idx) => &name[..idx],
        None => name,
    }
}
