/// Appends `additions` to `holder`, skipping entries already present.
///
/// Membership is exact and case-sensitive, unlike [`normalize`]. Stops once
/// `limit` entries were appended; returns how many were.
///
/// [`normalize`]: super::normalizer::normalize
pub fn merge_unique<S: AsRef<str>>(holder: &mut Vec<String>, additions: &[S], limit: usize) -> usize {
	if limit == 0 {
		return 0;
	}
	let mut added = 0;
	for s in additions {
		let s = s.as_ref();
		if s.is_empty() || holder.iter().any(|h| h == s) {
			continue;
		}
		holder.push(s.to_owned());
		added += 1;
		if added == limit {
			break;
		}
	}
	added
}
