//! A pull-driven pipeline: an async generator fed from a rendezvous
//! channel, post-processed with sequence combinators.

use randevu::{Runner, run_async};
use randevu_channel::{InputChannel, OutputChannel, channel};
use randevu_gen::{async_generate, generate};
use std::thread;

fn main() {
    // A sync generator is just a lazy iterator.
    let fibs = generate(|scope| async move {
        let (mut a, mut b) = (0u64, 1u64);
        loop {
            scope.yield_value(a).await;
            (a, b) = (b, a + b);
        }
    });
    let first: Vec<u64> = fibs.iter().take(8).collect();
    println!("fibs: {:?}", first);

    // An async generator pulling its raw material from a channel.
    let feed = channel::<u64>(Runner::Synchronous);

    let tx = feed.clone();
    let producer = thread::spawn(move || {
        run_async(async move {
            for n in 1..=6u64 {
                tx.send_async(n).await?;
            }
            Ok(())
        })
        .get()
    });

    let rx = feed.clone();
    let squares = async_generate(move |scope| {
        let rx = rx.clone();
        async move {
            for _ in 0..6 {
                let n = rx.recv_async().await?;
                scope.yield_value(n * n).await;
            }
            Ok(())
        }
    });

    let odd_squares = squares.filter(|n| n % 2 == 1).map(|n| format!("{}²", n));
    println!("odd squares: {:?}", odd_squares.to_list().get().unwrap());

    producer.join().unwrap().unwrap();
    println!("Example completed successfully!");
}
