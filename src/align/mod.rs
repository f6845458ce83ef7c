//! Order-preserving alignment of two event sequences.
//!
//! Events are paired with a longest-common-subsequence table driven by
//! [`similar`] instead of equality. The full table is kept for the
//! backtrack, so time and memory grow with the product of the two event
//! counts; comparisons beyond roughly a thousand events per side get slow.

use tracing::{debug, warn};

use crate::event::{Event, QorSubtype};
use crate::index::EventIndex;

/// Above this many events on either side alignment is noticeably slow.
pub const SLOW_ALIGN_EVENTS: usize = 1000;

/// Line numbers of one aligned row. `None` marks a gap on that side.
pub type AlignedPair = (Option<usize>, Option<usize>);

/// Whether two events may be paired.
///
/// A missing event is similar to anything. Otherwise categories must
/// match, heartbeats must share a shape and a compatible phase name, and
/// other events must share the first word of their message.
pub fn similar(a: Option<&Event>, b: Option<&Event>) -> bool {
    let (Some(a), Some(b)) = (a, b) else {
        return true;
    };
    if a.category() != b.category() {
        return false;
    }

    let (Some(qa), Some(qb)) = (a.as_qor(), b.as_qor()) else {
        return a.headline() == b.headline();
    };
    if qa.subtype != qb.subtype {
        return false;
    }

    let (n1, n2) = (qa.name.as_str(), qb.name.as_str());
    let wildcard = |name: &str| match qa.subtype {
        QorSubtype::Aps => name.is_empty() || name == "OPT",
        QorSubtype::Npo | QorSubtype::Nro => name.is_empty() || name.starts_with("Ph."),
    };

    wildcard(n1) || wildcard(n2) || n1 == n2
}

/// Align the events of two indices, returning rows in output order.
pub fn align(left: &EventIndex, right: &EventIndex) -> Vec<AlignedPair> {
    let l: Vec<&Event> = left.iter().collect();
    let r: Vec<&Event> = right.iter().collect();
    let (m, n) = (l.len(), r.len());

    if m > SLOW_ALIGN_EVENTS || n > SLOW_ALIGN_EVENTS {
        warn!(
            left = m,
            right = n,
            "more than {SLOW_ALIGN_EVENTS} events on one side, finding best match may be slow"
        );
    }

    let pair_ok = |i: usize, j: usize| similar(Some(l[i - 1]), Some(r[j - 1]));

    let mut dp = vec![vec![0u32; n + 1]; m + 1];
    for i in 1..=m {
        for j in 1..=n {
            dp[i][j] = if pair_ok(i, j) {
                dp[i - 1][j - 1] + 1
            } else {
                dp[i - 1][j].max(dp[i][j - 1])
            };
        }
    }

    let mut path = Vec::with_capacity(m + n);
    let (mut i, mut j) = (m, n);
    while i > 0 || j > 0 {
        if i > 0 && j > 0 {
            let (diag, up, back) = (dp[i - 1][j - 1], dp[i - 1][j], dp[i][j - 1]);
            if pair_ok(i, j) && diag >= up && diag >= back {
                path.push((Some(l[i - 1].line), Some(r[j - 1].line)));
                i -= 1;
                j -= 1;
            } else if up >= back {
                path.push((Some(l[i - 1].line), None));
                i -= 1;
            } else {
                path.push((None, Some(r[j - 1].line)));
                j -= 1;
            }
        } else if i > 0 {
            path.push((Some(l[i - 1].line), None));
            i -= 1;
        } else {
            path.push((None, Some(r[j - 1].line)));
            j -= 1;
        }
    }
    path.reverse();

    debug!(left = m, right = n, rows = path.len(), matched = dp[m][n], "aligned logs");

    path
}
