use crate::config::OperatorSettings;

/// Middle segment of systemd-style cgroup paths (`slice:prefix:name`).
pub const SYSTEMD_CGROUP_PREFIX: &str = "sandbox-spec";

pub fn cgroups_enabled(settings: &OperatorSettings) -> bool {
    !settings.disable_cgroup
}

/// Lexically cleans a cgroup parent: repeated separators and `.` segments
/// collapse, `..` removes the previous segment and cannot climb above the
/// root. An empty parent is the root.
fn clean_parent(parent: &str) -> (bool, Vec<&str>) {
    let rooted = parent.is_empty() || parent.starts_with('/');
    let mut segments: Vec<&str> = vec![];
    for segment in parent.split('/') {
        match segment {
            "" | "." => {}
            ".." => match segments.last() {
                Some(&last) if last != ".." => {
                    segments.pop();
                }
                _ if rooted => {}
                _ => segments.push(segment),
            },
            _ => segments.push(segment),
        }
    }
    (rooted, segments)
}

/// Cgroup path for a sandbox under `parent`. A parent whose last segment is
/// a systemd slice produces the `slice:prefix:id` form runtimes expect for
/// the systemd driver; anything else is a plain directory path. Equivalent
/// spellings of a parent give the same path.
pub fn cgroups_path_for(parent: &str, id: &str) -> String {
    let (rooted, mut segments) = clean_parent(parent);
    if let Some(base) = segments.last().filter(|base| base.ends_with(".slice")) {
        return format!("{}:{}:{}", base, SYSTEMD_CGROUP_PREFIX, id);
    }
    segments.push(id);
    let path = segments.join("/");
    if rooted { format!("/{}", path) } else { path }
}

/// The runtime spec's `cgroupsPath`: empty when cgroups are disabled.
pub fn sandbox_cgroups_path(
    settings: &OperatorSettings,
    parent: &str,
    id: &str,
) -> String {
    if cgroups_enabled(settings) {
        cgroups_path_for(parent, id)
    } else {
        String::new()
    }
}
