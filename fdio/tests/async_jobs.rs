use fdio::{Buffer, Error, Pipe, WorkerState};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, mpsc};
use std::thread;
use std::time::Duration;

#[test]
fn reads_complete_in_submission_order() {
    let (reader, writer) = Pipe::new().unwrap().into_parts();
    let (tx, rx) = mpsc::channel();

    for size in [5, 3] {
        let tx = tx.clone();
        reader
            .async_read(Buffer::new(size), size, move |buffer, n| {
                tx.send(buffer.as_slice()[..n].to_vec()).unwrap();
            })
            .unwrap();
    }

    writer.write_str("ABCDE").unwrap();
    writer.write_str("XYZ").unwrap();

    assert_eq!(rx.recv().unwrap(), b"ABCDE");
    assert_eq!(rx.recv().unwrap(), b"XYZ");
}

#[test]
fn callbacks_run_once_each_in_order() {
    const JOBS: usize = 64;

    let pipe = Pipe::new().unwrap();
    let order = Arc::new(Mutex::new(Vec::new()));

    for i in 0..JOBS {
        let order = order.clone();
        let mut buffer = Buffer::new(1);
        buffer.fill(&[i as u8]).unwrap();

        pipe.writer()
            .async_write(buffer, 1, move |_, n| {
                assert_eq!(n, 1);
                order.lock().unwrap().push(i);
            })
            .unwrap();
    }

    let mut received = [0u8; JOBS];
    assert_eq!(pipe.read(&mut received, JOBS).unwrap(), JOBS);

    let expected: Vec<u8> = (0..JOBS as u8).collect();
    assert_eq!(received.to_vec(), expected);

    drop(pipe);
    assert_eq!(*order.lock().unwrap(), (0..JOBS).collect::<Vec<_>>());
}

#[test]
fn close_flushes_every_pending_job() {
    const JOBS: usize = 16;

    let (reader, writer) = Pipe::new().unwrap().into_parts();
    let done = Arc::new(AtomicUsize::new(0));

    for _ in 0..JOBS {
        let done = done.clone();
        writer
            .async_write(Buffer::from(&b"data"[..]), 4, move |_, n| {
                assert_eq!(n, 4);
                done.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();
    }

    assert_eq!(writer.worker_state(), WorkerState::Running);
    writer.close().unwrap();

    assert_eq!(done.load(Ordering::SeqCst), JOBS);

    let mut buffer = vec![0u8; JOBS * 4];
    assert_eq!(reader.read(&mut buffer, JOBS * 4).unwrap(), JOBS * 4);
}

#[test]
fn close_waits_for_a_blocked_read() {
    let (reader, writer) = Pipe::new().unwrap().into_parts();
    let (tx, rx) = mpsc::channel();

    reader
        .async_read(Buffer::new(4), 4, move |buffer, n| {
            tx.send((buffer, n)).unwrap();
        })
        .unwrap();

    let closer = thread::spawn(move || reader.close().unwrap());

    thread::sleep(Duration::from_millis(50));
    assert!(!closer.is_finished());

    writer.write_str("late").unwrap();
    closer.join().unwrap();

    let (buffer, n) = rx.recv().unwrap();
    assert_eq!(n, 4);
    assert!(buffer.compare(b"late", 4));
}

#[test]
fn end_of_stream_reports_a_short_count() {
    let (reader, writer) = Pipe::new().unwrap().into_parts();
    let (tx, rx) = mpsc::channel();

    writer.write_str("ab").unwrap();
    drop(writer);

    reader
        .async_read(Buffer::new(10), 10, move |_, n| tx.send(n).unwrap())
        .unwrap();

    assert_eq!(rx.recv().unwrap(), 2);
}

#[test]
fn failed_transfer_still_calls_back() {
    let pipe = Pipe::new().unwrap();
    let (tx, rx) = mpsc::channel();

    // The read end rejects write(2).
    pipe.reader()
        .async_write(Buffer::from(&b"oops"[..]), 4, move |_, n| {
            tx.send(n).unwrap()
        })
        .unwrap();

    assert_eq!(rx.recv().unwrap(), 0);
}

#[test]
fn undersized_buffer_is_rejected_without_starting_the_worker() {
    let pipe = Pipe::new().unwrap();

    let result = pipe.reader().async_read(Buffer::new(2), 3, |_, _| {});
    assert!(matches!(result, Err(Error::BufferTooSmall { .. })));
    assert_eq!(pipe.reader().worker_state(), WorkerState::Idle);
    assert_eq!(pipe.reader().pending_jobs(), 0);
}

#[test]
fn worker_starts_on_first_call_and_terminates_on_close() {
    let (reader, writer) = Pipe::new().unwrap().into_parts();
    assert_eq!(writer.worker_state(), WorkerState::Idle);

    writer
        .async_write(Buffer::from(&b"x"[..]), 1, |_, _| {})
        .unwrap();
    assert_eq!(writer.worker_state(), WorkerState::Running);

    writer
        .async_write(Buffer::from(&b"y"[..]), 1, |_, _| {})
        .unwrap();
    assert_eq!(writer.worker_state(), WorkerState::Running);

    writer.close().unwrap();

    let mut buffer = [0u8; 2];
    assert_eq!(reader.read(&mut buffer, 2).unwrap(), 2);
    assert_eq!(&buffer, b"xy");
}

#[test]
fn raw_memory_transfers() {
    let pipe = Pipe::new().unwrap();

    let source = b"raw bytes".to_vec();
    let mut target = vec![0u8; source.len()];
    let (tx, rx) = mpsc::channel();

    let write_tx = tx.clone();
    unsafe {
        pipe.writer()
            .async_write_raw(source.as_ptr(), source.len(), move |_, n| {
                write_tx.send(("write", n)).unwrap();
            })
            .unwrap();

        pipe.reader()
            .async_read_raw(target.as_mut_ptr(), target.len(), move |_, n| {
                tx.send(("read", n)).unwrap();
            })
            .unwrap();
    }

    let mut events = vec![rx.recv().unwrap(), rx.recv().unwrap()];
    events.sort();
    assert_eq!(events, vec![("read", 9), ("write", 9)]);

    // Both callbacks ran, so the worker no longer touches the memory.
    assert_eq!(target, source);
}

#[test]
fn synchronous_and_asynchronous_calls_mix() {
    let pipe = Pipe::new().unwrap();
    let (tx, rx) = mpsc::channel();

    pipe.reader()
        .async_read(Buffer::new(6), 6, move |buffer, n| {
            tx.send(buffer.as_slice()[..n].to_vec()).unwrap();
        })
        .unwrap();

    pipe.write_str("sync->").unwrap();
    assert_eq!(rx.recv().unwrap(), b"sync->");
}

#[test]
fn last_owner_dropped_inside_its_own_callback() {
    let (reader, writer) = Pipe::new().unwrap().into_parts();
    let reader = Arc::new(reader);
    let (tx, rx) = mpsc::channel();

    let owner = reader.clone();
    let first = tx.clone();
    reader
        .async_read(Buffer::new(1), 1, move |_, n| {
            drop(owner);
            first.send(("first", n)).unwrap();
        })
        .unwrap();

    // Queued behind the dropping callback; it still has to report.
    reader
        .async_read(Buffer::new(1), 1, move |_, n| {
            tx.send(("second", n)).unwrap();
        })
        .unwrap();

    drop(reader);
    writer.write_str("ab").unwrap();

    let timeout = Duration::from_secs(5);
    let mut events = vec![
        rx.recv_timeout(timeout).unwrap(),
        rx.recv_timeout(timeout).unwrap(),
    ];
    events.sort();
    assert_eq!(events, vec![("first", 1), ("second", 1)]);

    // The read end was closed during the drop.
    assert!(writer.write_str("c").is_err());
}
