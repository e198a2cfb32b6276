//! Process-owned session state.

use auth::AccessToken;
use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use tracing::info;
use watchlist::Watchlist;

/// UTC offset of the exchange's calendar (Asia/Seoul, no DST).
const KST_OFFSET_SECS: i32 = 9 * 3600;

/// Trading date of `now` on the exchange calendar.
pub fn trading_date(now: DateTime<Utc>) -> NaiveDate {
    FixedOffset::east_opt(KST_OFFSET_SECS)
        .map(|kst| now.with_timezone(&kst).date_naive())
        .unwrap_or_else(|| now.date_naive())
}

/// Everything one operator session owns: the watchlist document, the
/// in-memory token and whether the document has unsaved changes.
///
/// Components borrow it per call; nothing else holds session state.
#[derive(Debug)]
pub struct Session {
    watchlist: Watchlist,
    token: Option<AccessToken>,
    trading_date: NaiveDate,
    dirty: bool,
}

impl Session {
    pub fn new(watchlist: Watchlist, trading_date: NaiveDate) -> Self {
        Self {
            watchlist,
            token: None,
            trading_date,
            dirty: false,
        }
    }

    pub fn watchlist(&self) -> &Watchlist {
        &self.watchlist
    }

    /// Mutable access; the document is marked for saving.
    pub fn watchlist_mut(&mut self) -> &mut Watchlist {
        self.dirty = true;
        &mut self.watchlist
    }

    pub fn token(&self) -> Option<&AccessToken> {
        self.token.as_ref()
    }

    pub(crate) fn set_token(&mut self, token: AccessToken) {
        self.token = Some(token);
    }

    pub fn trading_date(&self) -> NaiveDate {
        self.trading_date
    }

    /// Move to `date`. Dispatch state is keyed by date, so this alone
    /// re-enables both legs on a new day.
    pub(crate) fn roll_to(&mut self, date: NaiveDate) {
        if date != self.trading_date {
            info!(from = %self.trading_date, to = %date, "New trading date");
            self.trading_date = date;
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub(crate) fn mark_clean(&mut self) {
        self.dirty = false;
    }
}
