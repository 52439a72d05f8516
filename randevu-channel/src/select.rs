use randevu::{Error, Promise, SubscriptionToken};

use crate::rendezvous::Channel;

type Arm<R> = Box<dyn FnOnce(SubscriptionToken, Promise<R>)>;

/// One-of-many receive: arms a receive on every registered channel and
/// fires exactly one branch.
///
/// All branches share a [`SubscriptionToken`]; the first delivery
/// releases it and runs its handler, every later delivery sees a lost
/// election. Channels hold the token alongside their parked receivers,
/// so losing branches are unparked lazily and their values go back to
/// the senders rather than being dropped.
///
/// Which branch wins when several channels are ready is nondeterministic.
///
/// ```
/// use randevu::Runner;
/// use randevu_channel::{Channel, OutputChannel, SelectBuilder};
///
/// let left: Channel<&str> = Channel::new(Runner::Synchronous);
/// let right: Channel<&str> = Channel::new(Runner::Synchronous);
/// left.send("ping", Box::new(|_| {}), None);
///
/// let winner = SelectBuilder::new()
///     .on(&left, |v| format!("left {}", v))
///     .on(&right, |v| format!("right {}", v))
///     .run();
/// assert_eq!(winner.get().unwrap(), "left ping");
/// ```
pub struct SelectBuilder<R: Send + Sync + 'static> {
    arms: Vec<Arm<R>>,
    seen: Vec<usize>,
    poisoned: Option<Error>,
}

impl<R: Send + Sync + 'static> Default for SelectBuilder<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Send + Sync + 'static> SelectBuilder<R> {
    /// Creates a builder with no branches.
    pub fn new() -> Self {
        Self {
            arms: Vec::new(),
            seen: Vec::new(),
            poisoned: None,
        }
    }

    /// Registers a receive branch on `channel`. Registering the same
    /// channel twice poisons the builder; `run` then fails without
    /// arming anything.
    pub fn on<T: Send + 'static>(
        mut self,
        channel: &Channel<T>,
        handler: impl FnOnce(T) -> R + Send + 'static,
    ) -> Self {
        let id = channel.id();
        if self.seen.contains(&id) {
            self.poisoned
                .get_or_insert(Error::Misuse("two handlers registered for the same channel"));
            return self;
        }
        self.seen.push(id);

        let channel = channel.clone();
        self.arms.push(Box::new(move |token, promise| {
            channel.receive_boxed(
                Box::new(move |result| {
                    // The channel has already run the election for any
                    // value it hands to a tokened receiver, so an `Ok`
                    // here is the winning branch. Failures race the
                    // promise's single-assignment cell instead.
                    match result {
                        Ok(value) => {
                            promise.complete(handler(value));
                        }
                        Err(error) => {
                            promise.complete_exceptionally(error);
                        }
                    }
                }),
                Some(token),
            );
        }));
        self
    }

    /// Arms every branch and returns the promise the winning branch
    /// settles. Exactly one branch fires.
    pub fn run(self) -> Promise<R> {
        let promise = Promise::new();
        if let Some(error) = self.poisoned {
            promise.complete_exceptionally(error);
            return promise;
        }
        let token = SubscriptionToken::new();
        for arm in self.arms {
            arm(token.clone(), promise.clone());
        }
        promise
    }
}

/// Blocks on exactly one of several channels.
///
/// Expands to a [`SelectBuilder`] with one branch per arm and waits for
/// the winning branch's result. All arm bodies must produce the same
/// type.
///
/// # Examples
///
/// ```
/// use randevu::Runner;
/// use randevu_channel::{OutputChannel, channel, select};
///
/// let numbers = channel::<i32>(Runner::Synchronous);
/// let words = channel::<String>(Runner::Synchronous);
///
/// numbers.send(10, Box::new(|_| {}), None);
///
/// let out = select! {
///     n = numbers => n.to_string(),
///     w = words => w,
/// };
/// assert_eq!(out.unwrap(), "10");
/// ```
#[macro_export]
macro_rules! select {
    ( $($name:pat = $ch:expr => $body:expr),+ $(,)? ) => {{
        $crate::SelectBuilder::new()
        $(
            .on(&$ch, move |$name| $body)
        )+
        .run()
        .get()
    }};
}
