/// Minimal LIFO interface over a growable sequence of `Copy` values
pub trait Stack {
    /// Type of the values that are pushed onto the stack.
    type Item: Copy;

    /// Return the topmost value of the Stack, or `None` if it is empty
    fn peek(&self) -> Option<Self::Item>;

    /// Return a mutable reference to the topmost value of the stack without otherwise
    /// mutating the stack itself.
    fn peek_mut(&mut self) -> Option<&mut Self::Item>;

    /// Like `peek`, but the topmost value of the stack is removed if it exists.
    fn pop(&mut self) -> Option<Self::Item>;

    /// Push `item` onto the top of the stack.
    fn push(&mut self, item: Self::Item);

    /// Number of values currently on the stack
    fn depth(&self) -> usize;

    /// Given a closure that returns `None` in the case of a valid value to push,
    /// and `Some(err)` if an error occured, pre-validate and push `item` onto the
    /// Stack.
    ///
    /// The closure receives the current depth and the item to be pushed.
    /// If `Err(_)` is returned, the mutably borrowed receiver is unmodified.
    fn push_validated<Error, F: Fn(usize, Self::Item) -> Option<Error>>(
        &mut self,
        item: Self::Item,
        validate: F,
    ) -> Result<(), Error> {
        match validate(self.depth(), item) {
            None => {
                self.push(item);
                Ok(())
            }
            Some(err) => Err(err),
        }
    }
}

impl<T: Copy> Stack for Vec<T> {
    type Item = T;

    fn peek(&self) -> Option<Self::Item> {
        self.last().copied()
    }

    fn pop(&mut self) -> Option<Self::Item> {
        Vec::pop(self)
    }

    fn push(&mut self, item: Self::Item) {
        Vec::push(self, item)
    }

    fn peek_mut(&mut self) -> Option<&mut Self::Item> {
        self.last_mut()
    }

    fn depth(&self) -> usize {
        self.len()
    }
}

cfg_if::cfg_if! {
    if #[cfg(feature = "smallvec_framestack")] {
        impl<T: Copy, const N: usize> Stack for smallvec::SmallVec<[T; N]> {
            type Item = T;

            fn peek(&self) -> Option<Self::Item> {
                self.last().copied()
            }

            fn pop(&mut self) -> Option<Self::Item> {
                smallvec::SmallVec::pop(self)
            }

            fn push(&mut self, item: Self::Item) {
                smallvec::SmallVec::push(self, item)
            }

            fn peek_mut(&mut self) -> Option<&mut Self::Item> {
                self.last_mut()
            }

            fn depth(&self) -> usize {
                self.len()
            }
        }

        /// Concrete stack type used by protocol readers and writers
        ///
        /// With `smallvec_framestack`, the first 16 frames are stored inline.
        pub type FrameStack<T> = smallvec::SmallVec<[T; 16]>;
    } else {
        /// Concrete stack type used by protocol readers and writers
        pub type FrameStack<T> = Vec<T>;
    }
}
