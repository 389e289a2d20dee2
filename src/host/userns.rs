use log::trace;

/// Reports whether the current process lives in a non-initial user
/// namespace. The initial namespace maps the full 32-bit id range onto
/// itself; anything else is a nested namespace.
pub fn running_in_user_namespace() -> bool {
    match std::fs::read_to_string("/proc/self/uid_map") {
        Ok(uid_map) => !is_initial_uid_map(&uid_map),
        Err(e) => {
            trace!("Unable to read /proc/self/uid_map: {}", e);
            false
        }
    }
}

fn is_initial_uid_map(uid_map: &str) -> bool {
    let mut lines = uid_map.lines().filter(|line| !line.trim().is_empty());
    let (Some(line), None) = (lines.next(), lines.next()) else {
        return false;
    };
    let fields: Vec<&str> = line.split_whitespace().collect();
    fields == ["0", "0", "4294967295"]
}
