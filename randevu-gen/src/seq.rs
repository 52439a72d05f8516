use std::sync::Arc;

use randevu::{Promise, run_async};

use crate::async_gen::{AsyncIterator, AsyncSequence, async_generate};

impl<T: Send + Sync + 'static> AsyncSequence<T> {
    /// A sequence of `f` applied to each element.
    pub fn map<U>(&self, f: impl Fn(T) -> U + Send + Sync + 'static) -> AsyncSequence<U>
    where
        U: Send + 'static,
    {
        let source = self.clone();
        let f = Arc::new(f);
        async_generate(move |scope| {
            let it = source.iterator();
            let f = f.clone();
            async move {
                while it.has_next().await? {
                    scope.yield_value(f(it.next()?)).await;
                }
                Ok(())
            }
        })
    }

    /// The subsequence of elements satisfying `keep`.
    pub fn filter(&self, keep: impl Fn(&T) -> bool + Send + Sync + 'static) -> AsyncSequence<T> {
        let source = self.clone();
        let keep = Arc::new(keep);
        async_generate(move |scope| {
            let it = source.iterator();
            let keep = keep.clone();
            async move {
                while it.has_next().await? {
                    let value = it.next()?;
                    if keep(&value) {
                        scope.yield_value(value).await;
                    }
                }
                Ok(())
            }
        })
    }

    /// Whether the sequence contains `needle`; short-circuits on the
    /// first match without pulling the rest.
    pub fn contains(&self, needle: T) -> Promise<bool>
    where
        T: PartialEq,
    {
        let it = self.iterator();
        run_async(async move {
            while it.has_next().await? {
                if it.next()? == needle {
                    return Ok(true);
                }
            }
            Ok(false)
        })
    }

    /// Drains the sequence, visiting each element.
    pub fn for_each(&self, visit: impl FnMut(T) + Send + 'static) -> Promise<()> {
        let it = self.iterator();
        let mut visit = visit;
        run_async(async move {
            while it.has_next().await? {
                visit(it.next()?);
            }
            Ok(())
        })
    }

    /// Drains the sequence into a vector.
    pub fn to_list(&self) -> Promise<Vec<T>> {
        self.to_list_with_capacity(0)
    }

    /// Drains the sequence into a vector pre-sized for `expected`
    /// elements.
    pub fn to_list_with_capacity(&self, expected: usize) -> Promise<Vec<T>> {
        let it = self.iterator();
        run_async(async move {
            let mut out = Vec::with_capacity(expected);
            while it.has_next().await? {
                out.push(it.next()?);
            }
            Ok(out)
        })
    }
}

/// An asynchronous sequence over an in-memory vector.
pub fn async_sequence_of<T>(values: Vec<T>) -> AsyncSequence<T>
where
    T: Clone + Send + Sync + 'static,
{
    async_generate(move |scope| {
        let values = values.clone();
        async move {
            for value in values {
                scope.yield_value(value).await;
            }
            Ok(())
        }
    })
}
