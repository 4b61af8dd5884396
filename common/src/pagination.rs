//! Keyset pagination over lists ordered by ascending IDs.
//!
//! Every list item is addressed by its own ID, so the ID serves as the cursor
//! pointing to the item as well.

/// Direction a [`Page`] is selected in relatively to its cursor.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Direction {
    /// Items following the cursor.
    Forward,

    /// Items preceding the cursor.
    Backward,
}

impl Direction {
    /// Returns comparison operator an ID passing the cursor satisfies.
    #[must_use]
    pub const fn operator(self) -> &'static str {
        match self {
            Self::Forward => ">",
            Self::Backward => "<",
        }
    }

    #[cfg(feature = "postgres")]
    /// Returns SQL order the items are fetched in.
    #[must_use]
    pub const fn sql_order(self) -> &'static str {
        match self {
            Self::Forward => "ASC",
            Self::Backward => "DESC",
        }
    }
}

/// Arguments selecting a [`Page`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Arguments<Id> {
    /// [`Direction`] to select items in.
    pub direction: Direction,

    /// Maximum number of items on the [`Page`].
    pub limit: usize,

    /// ID of the item to select the [`Page`] after (or before).
    pub cursor: Option<Id>,
}

impl<Id> Arguments<Id> {
    /// Creates new [`Arguments`] out of either `first` and `after` or `last`
    /// and `before`, selecting the `default` number of leading items if none
    /// is provided.
    ///
    /// [`None`] is returned if both directions are mixed, or the number of
    /// items is negative.
    pub fn new<Num: TryInto<usize>>(
        first: Option<Num>,
        after: Option<Id>,
        last: Option<Num>,
        before: Option<Id>,
        default: Num,
    ) -> Option<Self> {
        let (direction, limit, cursor) = match (first, after, last, before) {
            (first, after, None, None) => {
                (Direction::Forward, first.unwrap_or(default), after)
            }
            (None, None, Some(last), before) => {
                (Direction::Backward, last, before)
            }
            _ => return None,
        };
        Some(Self {
            direction,
            limit: limit.try_into().ok()?,
            cursor,
        })
    }

    /// Indicates whether the item with the provided `id` lies past the cursor
    /// of these [`Arguments`].
    #[must_use]
    pub fn passes(&self, id: &Id) -> bool
    where
        Id: Ord,
    {
        self.cursor.as_ref().map_or(true, |c| match self.direction {
            Direction::Forward => id > c,
            Direction::Backward => id < c,
        })
    }
}

/// Page of a list, always in ascending order of IDs.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Page<Id> {
    /// IDs of the items on this [`Page`].
    pub ids: Vec<Id>,

    /// Indicator whether more items follow this [`Page`].
    pub has_next_page: bool,

    /// Indicator whether more items precede this [`Page`].
    pub has_previous_page: bool,
}

impl<Id> Page<Id> {
    /// Creates a new [`Page`] out of the `ids` fetched in the [`Direction`] of
    /// the provided [`Arguments`].
    ///
    /// Fetching a single extra ID over the [`Arguments::limit`] reveals there
    /// are more items in that [`Direction`].
    #[must_use]
    pub fn new(
        args: &Arguments<Id>,
        ids: impl IntoIterator<Item = Id>,
    ) -> Self {
        let mut ids = ids.into_iter().collect::<Vec<_>>();
        let has_more = ids.len() > args.limit;
        ids.truncate(args.limit);

        match args.direction {
            Direction::Forward => Self {
                ids,
                has_next_page: has_more,
                has_previous_page: false,
            },
            Direction::Backward => {
                ids.reverse();
                Self {
                    ids,
                    has_next_page: false,
                    has_previous_page: has_more,
                }
            }
        }
    }

    /// Returns the ID of the first item on this [`Page`].
    #[must_use]
    pub fn start_cursor(&self) -> Option<&Id> {
        self.ids.first()
    }

    /// Returns the ID of the last item on this [`Page`].
    #[must_use]
    pub fn end_cursor(&self) -> Option<&Id> {
        self.ids.last()
    }
}

/// Selector of a [`Page`] out of a filtered list.
#[derive(Clone, Copy, Debug)]
pub struct Selector<Id, F> {
    /// [`Arguments`] of the [`Page`].
    pub arguments: Arguments<Id>,

    /// Filter narrowing the list.
    pub filter: F,
}

/// Defines pagination types of a list of the provided IDs narrowed by the
/// provided filter.
#[expect(clippy::module_name_repetitions, reason = "more readable")]
#[macro_export]
macro_rules! define_pagination {
    ($id:ty, $filter:ty) => {
        #[doc = "A [`Page`] of the list."]
        pub type Page = $crate::pagination::Page<$id>;

        #[doc = "Arguments for selecting a [`Page`]."]
        pub type Arguments = $crate::pagination::Arguments<$id>;

        #[doc = "[`Page`] selector."]
        pub type Selector = $crate::pagination::Selector<$id, $filter>;
    };
}

#[cfg(test)]
mod spec {
    use super::{Arguments, Direction, Page};

    #[test]
    fn defaults_to_leading_items() {
        let args = Arguments::<u8>::new(None, None, None, None, 10).unwrap();

        assert_eq!(args.direction, Direction::Forward);
        assert_eq!(args.limit, 10);
        assert_eq!(args.cursor, None);
    }

    #[test]
    fn rejects_mixed_directions() {
        assert!(Arguments::<u8>::new(Some(1), None, Some(1), None, 10).is_none());
        assert!(Arguments::new(None, Some(1_u8), None, Some(2), 10).is_none());
        assert!(Arguments::<u8>::new(Some(-1), None, None, None, 10).is_none());
    }

    #[test]
    fn forward_page_detects_next() {
        let args = Arguments::new(Some(2), Some(3_u8), None, None, 10).unwrap();
        assert!(!args.passes(&3));
        assert!(args.passes(&4));

        let page = Page::new(&args, [4, 5, 6]);
        assert_eq!(page.ids, [4, 5]);
        assert!(page.has_next_page);
        assert!(!page.has_previous_page);
        assert_eq!(page.end_cursor(), Some(&5));
    }

    #[test]
    fn backward_page_keeps_ascending_order() {
        let args = Arguments::new(None, None, Some(2), Some(7_u8), 10).unwrap();
        assert!(args.passes(&6));
        assert!(!args.passes(&7));

        let page = Page::new(&args, [6, 5]);
        assert_eq!(page.ids, [5, 6]);
        assert!(!page.has_next_page);
        assert!(!page.has_previous_page);
        assert_eq!(page.start_cursor(), Some(&5));
    }
}
