use futures::executor::block_on;
use randevu::{Runner, run_async};
use randevu_channel::{InputChannel, OutputChannel, channel};
use std::thread;
use std::time::Duration;

#[test]
fn test_recv_async_as_std_future() {
    let c = channel::<i32>(Runner::Synchronous);

    let tx = c.clone();
    thread::spawn(move || {
        thread::sleep(Duration::from_millis(10));
        tx.send_async(3);
    });

    let got = block_on(c.recv_async());
    assert_eq!(got, Ok(3));
}

#[test]
fn test_send_async_as_std_future() {
    let c = channel::<i32>(Runner::Synchronous);

    let rx = c.clone();
    let consumer = thread::spawn(move || rx.recv_async().get());

    block_on(c.send_async(5)).unwrap();
    assert_eq!(consumer.join().unwrap(), Ok(5));
}

#[test]
fn test_pipeline_of_coroutines() {
    // Three stages wired with rendezvous channels, all driven by
    // promise resumptions alone.
    let first = channel::<u32>(Runner::Synchronous);
    let second = channel::<u32>(Runner::Synchronous);

    let tx = first.clone();
    let source = run_async(async move {
        for i in 1..=5 {
            tx.send_async(i).await?;
        }
        Ok(())
    });

    let rx = first.clone();
    let tx = second.clone();
    let squarer = run_async(async move {
        for _ in 0..5 {
            let v = rx.recv_async().await?;
            tx.send_async(v * v).await?;
        }
        Ok(())
    });

    let rx = second.clone();
    let sink = run_async(async move {
        let mut out = Vec::new();
        for _ in 0..5 {
            out.push(rx.recv_async().await?);
        }
        Ok(out)
    });

    assert_eq!(sink.get(), Ok(vec![1, 4, 9, 16, 25]));
    source.get().unwrap();
    squarer.get().unwrap();
}

#[test]
fn test_coroutines_across_threads() {
    let c = channel::<String>(Runner::pool(2));

    let tx = c.clone();
    let producer = thread::spawn(move || {
        run_async(async move {
            for word in ["uno", "dos", "tres"] {
                tx.send_async(word.to_string()).await?;
            }
            Ok(())
        })
        .get()
    });

    let rx = c.clone();
    let consumer = run_async(async move {
        let mut seen = Vec::new();
        for _ in 0..3 {
            seen.push(rx.recv_async().await?);
        }
        Ok(seen)
    });

    assert_eq!(consumer.get(), Ok(vec!["uno".into(), "dos".into(), "tres".into()]));
    producer.join().unwrap().unwrap();
}
