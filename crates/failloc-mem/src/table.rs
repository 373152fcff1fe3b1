//! Growable tables with bump-rounded capacity.
//!
//! A [`Table`] tracks capacity only, never occupancy: every slot up to the
//! capacity exists and holds a value. Growing rounds the requested count up
//! to the next multiple of a caller-chosen bump, moves the existing slots
//! into fresh storage, fills the new slots with [`Zeroed::ZERO`] and then
//! runs an optional initializer on each new slot in ascending order.
//!
//! Capacity never shrinks except through [`Table::release`].
//!
//! ```
//! use failloc_mem::Table;
//!
//! let mut table: Table<u64> = Table::new();
//! let mut calls = 0;
//! table.grow_with(5, 4, |slot| {
//!     calls += 1;
//!     *slot = 7;
//! });
//! assert_eq!(table.capacity(), 8);
//! assert_eq!(calls, 8);
//!
//! table.grow(6, 4); // already large enough
//! assert_eq!(table.capacity(), 8);
//! ```

use std::fmt;
use std::ops::{Index, IndexMut};

use crate::error::Error;
use crate::fatal::fatal;
use crate::hooks::Bracket;
use crate::location::Site;

/// Types with an all-zero starting value.
///
/// New table slots hold `ZERO` before any initializer runs.
pub trait Zeroed: Sized {
    /// The zero value.
    const ZERO: Self;
}

macro_rules! impl_zeroed {
    ($($ty:ty => $zero:expr),* $(,)?) => {
        $(impl Zeroed for $ty {
            const ZERO: Self = $zero;
        })*
    };
}

impl_zeroed! {
    u8 => 0, u16 => 0, u32 => 0, u64 => 0, u128 => 0, usize => 0,
    i8 => 0, i16 => 0, i32 => 0, i64 => 0, i128 => 0, isize => 0,
    f32 => 0.0, f64 => 0.0,
    bool => false,
    char => '\0',
    () => (),
}

impl<T> Zeroed for Option<T> {
    const ZERO: Self = None;
}

impl<T> Zeroed for *const T {
    const ZERO: Self = std::ptr::null();
}

impl<T> Zeroed for *mut T {
    const ZERO: Self = std::ptr::null_mut();
}

impl<T: Zeroed, const N: usize> Zeroed for [T; N] {
    const ZERO: Self = [const { T::ZERO }; N];
}

impl<A: Zeroed, B: Zeroed> Zeroed for (A, B) {
    const ZERO: Self = (A::ZERO, B::ZERO);
}

/// Contiguous slots whose capacity grows in multiples of a bump.
pub struct Table<T> {
    slots: Vec<T>,
}

impl<T> Table<T> {
    /// An empty table with capacity 0. Does not allocate.
    #[must_use]
    pub const fn new() -> Self {
        Self { slots: Vec::new() }
    }

    /// Number of slots.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Bytes per slot.
    #[must_use]
    pub const fn element_size(&self) -> usize {
        std::mem::size_of::<T>()
    }

    /// True when the table has no slots.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Frees the storage and resets capacity to 0.
    pub fn release(&mut self) {
        self.slots = Vec::new();
    }

    /// The slot at `index`, if within capacity.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&T> {
        self.slots.get(index)
    }

    /// The slot at `index`, if within capacity.
    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        self.slots.get_mut(index)
    }

    /// All slots.
    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        &self.slots
    }

    /// All slots.
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.slots
    }

    /// Start of the storage; dangling when the capacity is 0.
    #[must_use]
    pub fn as_ptr(&self) -> *const T {
        self.slots.as_ptr()
    }

    /// Iterates over all slots.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.slots.iter()
    }

    /// Iterates mutably over all slots.
    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, T> {
        self.slots.iter_mut()
    }
}

impl<T: Zeroed> Table<T> {
    /// Ensures the table has more than `needed` slots.
    ///
    /// When `needed >= capacity` the capacity becomes the smallest multiple
    /// of `bump` strictly greater than `needed`; otherwise nothing happens.
    /// Returns the capacity afterwards. A zero `bump` on a growing call is
    /// fatal.
    ///
    /// `needed == capacity` always grows: a table of 8 slots grown with
    /// `grow(8, 4)` ends with 12.
    #[track_caller]
    pub fn grow(&mut self, needed: usize, bump: usize) -> usize {
        let site = Site::caller();
        let _bracket = Bracket::enter(site);
        self.grow_at(site, needed, bump, None::<fn(&mut T)>)
    }

    /// Like [`Table::grow`], then calls `init` once on every new slot, in
    /// ascending index order, after the slots were zero-filled.
    #[track_caller]
    pub fn grow_with<F>(&mut self, needed: usize, bump: usize, init: F) -> usize
    where
        F: FnMut(&mut T),
    {
        let site = Site::caller();
        let _bracket = Bracket::enter(site);
        self.grow_at(site, needed, bump, Some(init))
    }

    fn grow_at<F>(&mut self, site: Site, needed: usize, bump: usize, init: Option<F>) -> usize
    where
        F: FnMut(&mut T),
    {
        let current = self.slots.len();
        if needed < current {
            return current;
        }
        if bump == 0 {
            fatal(site, Error::ZeroBump)
        }

        let Some(new_capacity) = (needed / bump)
            .checked_add(1)
            .and_then(|n| n.checked_mul(bump))
        else {
            fatal(site, Error::OutOfMemory { size: usize::MAX })
        };

        let mut fresh: Vec<T> = Vec::new();
        if fresh.try_reserve_exact(new_capacity).is_err() {
            let size = new_capacity.saturating_mul(self.element_size());
            fatal(site, Error::OutOfMemory { size })
        }
        fresh.append(&mut self.slots);
        fresh.resize_with(new_capacity, || T::ZERO);

        if let Some(init) = init {
            fresh[current..].iter_mut().for_each(init);
        }

        // Old storage is released here.
        self.slots = fresh;

        failloc_log::debug!("{site}: table grown from {current} to {new_capacity} slots");
        new_capacity
    }
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Index<usize> for Table<T> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        &self.slots[index]
    }
}

impl<T> IndexMut<usize> for Table<T> {
    fn index_mut(&mut self, index: usize) -> &mut T {
        &mut self.slots[index]
    }
}

impl<'a, T> IntoIterator for &'a Table<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.slots.iter()
    }
}

impl<T: fmt::Debug> fmt::Debug for Table<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Table")
            .field("capacity", &self.capacity())
            .field("slots", &self.slots)
            .finish()
    }
}
