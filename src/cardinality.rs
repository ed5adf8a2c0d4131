use log::debug;

use crate::{dataset::TableHandle, error::AuditResult, select};

/// Absolute difference between the distinct counts of two columns expected to
/// be in one-to-one correspondence (an id and its description, say).
pub fn unique_count_delta(handle: &TableHandle, left: &str, right: &str) -> AuditResult<usize> {
    let left_count = select::unique_count(handle, &[left.to_string()])?;
    let right_count = select::unique_count(handle, &[right.to_string()])?;
    let delta = left_count.abs_diff(right_count);
    debug!(
        "'{}' has {} distinct value(s) in '{}', '{}' has {}",
        left, left_count, handle.name, right, right_count
    );
    Ok(delta)
}
