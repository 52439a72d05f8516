use rand::Rng;
use randevu::{Error, Runner};
use randevu_channel::{InputChannel, OutputChannel, SelectBuilder, channel, select};
use std::thread;
use std::time::Duration;

#[test]
fn test_select_basic() {
    let numbers = channel::<i32>(Runner::Synchronous);
    let words = channel::<String>(Runner::Synchronous);

    numbers.send_async(10);

    let out = select! {
        n = numbers => n.to_string(),
        w = words => w,
    };
    assert_eq!(out.unwrap(), "10");
}

#[test]
fn test_select_race() {
    let left = channel::<i32>(Runner::Synchronous);
    let right = channel::<i32>(Runner::Synchronous);

    let tx = right.clone();
    thread::spawn(move || {
        thread::sleep(Duration::from_millis(50));
        tx.send_async(20);
    });

    let out = select! {
        _v = left => panic!("should receive from right"),
        v = right => v,
    };
    assert_eq!(out.unwrap(), 20);
}

#[test]
fn test_select_duplicate_channel_rejected() {
    let c = channel::<i32>(Runner::Synchronous);

    let out = SelectBuilder::new()
        .on(&c, |v| v)
        .on(&c, |v| v)
        .run()
        .get();

    assert_eq!(
        out,
        Err(Error::Misuse("two handlers registered for the same channel"))
    );
}

#[test]
fn test_select_over_parked_receiver_fails() {
    let c = channel::<i32>(Runner::Synchronous);
    let _parked = c.recv_async();

    let out = SelectBuilder::new().on(&c, |v| v).run().get();
    assert_eq!(out, Err(Error::Misuse("another reader already waiting")));
}

#[test]
fn test_select_same_handler_shape_on_two_channels() {
    let left = channel::<&'static str>(Runner::Synchronous);
    let right = channel::<&'static str>(Runner::Synchronous);

    left.send_async("l");

    let got = SelectBuilder::new()
        .on(&left, str::to_string)
        .on(&right, str::to_string)
        .run()
        .get();
    assert_eq!(got.unwrap(), "l");
}

// Two channels, a hundred messages each, random pacing: the select loop
// must observe every message exactly once. Losing branches leave dead
// receivers behind; senders discard them and re-park, so nothing leaks
// and nothing is dropped.
#[test]
fn test_select_loop_conserves_messages() {
    let left = channel::<&'static str>(Runner::Synchronous);
    let right = channel::<&'static str>(Runner::Synchronous);

    let mut producers = vec![];
    for (ch, name) in [(left.clone(), "left"), (right.clone(), "right")] {
        producers.push(thread::spawn(move || {
            let mut rng = rand::rng();
            for _ in 0..100 {
                ch.send_async(name).get().unwrap();
                thread::sleep(Duration::from_micros(rng.random_range(0..200)));
            }
        }));
    }

    let mut left_count = 0usize;
    let mut right_count = 0usize;
    for _ in 0..200 {
        let name = select! {
            v = left => v,
            v = right => v,
        }
        .unwrap();
        match name {
            "left" => left_count += 1,
            "right" => right_count += 1,
            other => panic!("unexpected message {}", other),
        }
    }

    for p in producers {
        p.join().unwrap();
    }

    assert_eq!(left_count, 100);
    assert_eq!(right_count, 100);
}

// Weak fairness: with both sides producing on their own pacing, each
// branch wins at least once across the trials.
#[test]
fn test_select_weak_fairness() {
    let left = channel::<usize>(Runner::Synchronous);
    let right = channel::<usize>(Runner::Synchronous);

    let mut producers = vec![];
    for (ch, side) in [(left.clone(), 0usize), (right.clone(), 1usize)] {
        producers.push(thread::spawn(move || {
            let mut rng = rand::rng();
            for _ in 0..25 {
                ch.send_async(side).get().unwrap();
                thread::sleep(Duration::from_micros(rng.random_range(0..100)));
            }
        }));
    }

    let mut wins = [0usize; 2];
    for _ in 0..50 {
        let side = select! {
            v = left => v,
            v = right => v,
        }
        .unwrap();
        wins[side] += 1;
    }

    for p in producers {
        p.join().unwrap();
    }

    assert_eq!(wins, [25, 25]);
}
