use randevu::{Error, Runner, run_async};
use randevu_channel::{InputChannel, OutputChannel, channel};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

#[test]
fn test_send_then_receive() {
    let c = channel::<i32>(Runner::Synchronous);

    let pending = c.send_async(7);
    assert!(!pending.is_done());

    assert_eq!(c.recv_async().get(), Ok(7));
    assert_eq!(pending.try_get(), Some(Ok(())));
}

#[test]
fn test_receive_then_send() {
    let c = channel::<i32>(Runner::Synchronous);

    let pending = c.recv_async();
    assert!(!pending.is_done());

    assert_eq!(c.send_async(7).try_get(), Some(Ok(())));
    assert_eq!(pending.try_get(), Some(Ok(7)));
}

#[test]
fn test_simple_rendezvous_coroutines() {
    let c = channel::<String>(Runner::Synchronous);

    let tx = c.clone();
    let sender = run_async(async move {
        tx.send_async("hi".to_string()).await?;
        tx.send_async("bye".to_string()).await?;
        Ok(())
    });

    let rx = c.clone();
    let receiver = run_async(async move {
        assert_eq!(rx.recv_async().await?, "hi");
        assert_eq!(rx.recv_async().await?, "bye");
        Ok(())
    });

    sender.get().unwrap();
    receiver.get().unwrap();
}

#[test]
fn test_second_sender_rejected() {
    let c = channel::<i32>(Runner::Synchronous);

    let first = c.send_async(1);
    let second = c.send_async(2);

    assert_eq!(
        second.try_get(),
        Some(Err(Error::Misuse("another sender already waiting")))
    );

    // The parked sender is untouched and still delivers.
    assert_eq!(c.recv_async().get(), Ok(1));
    assert_eq!(first.try_get(), Some(Ok(())));
}

#[test]
fn test_second_receiver_rejected() {
    let c = channel::<i32>(Runner::Synchronous);

    let first = c.recv_async();
    let second = c.recv_async();

    assert_eq!(
        second.try_get(),
        Some(Err(Error::Misuse("another reader already waiting")))
    );
    assert!(!first.is_done());

    c.send_async(5);
    assert_eq!(first.try_get(), Some(Ok(5)));
}

#[test]
fn test_registered_sender_woken_by_receiver() {
    let c = channel::<i32>(Runner::Synchronous);
    let produced = Arc::new(AtomicUsize::new(0));

    let ready = c.register_sender_async();
    assert!(!ready.is_done());
    assert_eq!(produced.load(Ordering::SeqCst), 0);

    // Receiver interest unblocks the lazy producer.
    let incoming = c.recv_async();
    assert_eq!(ready.try_get(), Some(Ok(())));

    produced.fetch_add(1, Ordering::SeqCst);
    c.send_async(99);
    assert_eq!(incoming.try_get(), Some(Ok(99)));
    assert_eq!(produced.load(Ordering::SeqCst), 1);
}

#[test]
fn test_register_sender_with_receiver_already_waiting() {
    let c = channel::<i32>(Runner::Synchronous);

    let incoming = c.recv_async();
    let ready = c.register_sender_async();

    // Interest already exists; the producer may compute immediately.
    assert_eq!(ready.try_get(), Some(Ok(())));
    assert!(!incoming.is_done());

    c.send_async(3);
    assert_eq!(incoming.try_get(), Some(Ok(3)));
}

#[test]
fn test_second_registration_rejected() {
    let c = channel::<i32>(Runner::Synchronous);

    let _first = c.register_sender_async();
    let second = c.register_sender_async();

    assert_eq!(
        second.try_get(),
        Some(Err(Error::Misuse("another sender already waiting")))
    );
}

#[test]
fn test_send_supersedes_own_registration() {
    let c = channel::<i32>(Runner::Synchronous);

    let ready = c.register_sender_async();
    let sent = c.send_async(11);

    // The sender produced without waiting for interest; its stale
    // registration callback is dropped, never completed.
    assert!(!ready.is_done());
    assert!(!sent.is_done());

    assert_eq!(c.recv_async().get(), Ok(11));
    assert_eq!(sent.try_get(), Some(Ok(())));
    assert!(!ready.is_done());
}

#[test]
fn test_drop_with_parked_sender_leaves_promise_pending() {
    let c = channel::<i32>(Runner::Synchronous);
    let pending = c.send_async(7);

    drop(c);
    assert!(!pending.is_done());
}

#[test]
fn test_lazy_pipeline_roundtrip() {
    // A producer that only computes once the consumer asks for it.
    let c = channel::<u64>(Runner::Synchronous);
    let computed = Arc::new(AtomicUsize::new(0));

    let tx = c.clone();
    let counter = computed.clone();
    let producer = run_async(async move {
        for i in 0..4u64 {
            tx.register_sender_async().await?;
            counter.fetch_add(1, Ordering::SeqCst);
            tx.send_async(i * i).await?;
        }
        Ok(())
    });

    assert_eq!(computed.load(Ordering::SeqCst), 0);

    let rx = c.clone();
    let consumer = run_async(async move {
        let mut out = Vec::new();
        for _ in 0..4 {
            out.push(rx.recv_async().await?);
        }
        Ok(out)
    });

    assert_eq!(consumer.get(), Ok(vec![0, 1, 4, 9]));
    producer.get().unwrap();
    assert_eq!(computed.load(Ordering::SeqCst), 4);
}
