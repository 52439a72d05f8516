//! Simple example demonstrating rendezvous channels and select.

use randevu::{Runner, run_async};
use randevu_channel::{InputChannel, OutputChannel, channel, select};
use std::thread;
use std::time::Duration;

fn main() {
    // A rendezvous channel: each send parks until a receiver arrives.
    let greetings = channel::<String>(Runner::Synchronous);

    let tx = greetings.clone();
    let sender = run_async(async move {
        tx.send_async("merhaba".to_string()).await?;
        tx.send_async("hello".to_string()).await?;
        Ok(())
    });

    let rx = greetings.clone();
    let receiver = run_async(async move {
        println!("first:  {}", rx.recv_async().await?);
        println!("second: {}", rx.recv_async().await?);
        Ok(())
    });

    sender.get().unwrap();
    receiver.get().unwrap();

    // Select: two producers on their own channels, one consumer taking
    // whichever message shows up first.
    let fast = channel::<&'static str>(Runner::Synchronous);
    let slow = channel::<&'static str>(Runner::Synchronous);

    let tx = fast.clone();
    thread::spawn(move || {
        tx.send_async("fast lane");
    });
    let tx = slow.clone();
    thread::spawn(move || {
        thread::sleep(Duration::from_millis(50));
        tx.send_async("slow lane");
    });

    let winner = select! {
        v = fast => v,
        v = slow => v,
    }
    .unwrap();
    println!("winner: {}", winner);

    println!("Example completed successfully!");
}
