// Linux-specific helpers: /proc/meminfo.

/// Read installed memory ("MemTotal", KiB) from /proc/meminfo (Linux).
pub(super) fn read_mem_total_kib() -> Option<u64> {
    #[cfg(target_os = "linux")]
    {
        let content = std::fs::read_to_string("/proc/meminfo").ok()?;
        parse_mem_total_kib(&content)
    }
    #[cfg(not(target_os = "linux"))]
    None
}

#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
pub(super) fn parse_mem_total_kib(content: &str) -> Option<u64> {
    for line in content.lines() {
        if let Some(rest) = line.strip_prefix("MemTotal:") {
            let v = rest.trim().trim_end_matches("kB").trim();
            return v.parse::<u64>().ok().filter(|kib| *kib > 0);
        }
    }
    None
}
