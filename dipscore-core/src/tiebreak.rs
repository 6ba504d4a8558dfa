//! Ranking-position points shared among tied powers

/// Assign position points to centre counts, splitting them across ties.
///
/// `counts` must be sorted largest first. `position_points[i]` is the award
/// for finishing in position `i`; positions past the end of the list are
/// worth nothing. Powers tied on a count share the points of every position
/// they jointly occupy. The result lines up with `counts`.
pub fn allocate_position_points(counts: &[u8], position_points: &[f64]) -> Vec<f64> {
    let mut allocated = Vec::with_capacity(counts.len());
    let mut start = 0;

    while start < counts.len() {
        let tied = counts[start..]
            .iter()
            .take_while(|&&c| c == counts[start])
            .count();
        let end = start + tied;

        let pool: f64 = position_points
            .get(start..end.min(position_points.len()))
            .map(|points| points.iter().sum())
            .unwrap_or(0.0);
        let share = pool / tied as f64;
        allocated.extend(std::iter::repeat(share).take(tied));

        start = end;
    }

    allocated
}
