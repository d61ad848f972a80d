use fdio::{Buffer, Fifo, WorkerState};
use std::sync::mpsc;
use std::thread;

#[test]
fn fifo_connects_two_openers() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("channel");
    Fifo::create(&path, 0o600).unwrap();

    let writer_path = path.clone();
    let producer = thread::spawn(move || {
        // Blocks until the reader opens.
        let fifo = Fifo::open(&writer_path, libc::O_WRONLY | libc::O_CLOEXEC).unwrap();
        fifo.write_str("through the fifo").unwrap()
    });

    let fifo = Fifo::open(&path, libc::O_RDONLY | libc::O_CLOEXEC).unwrap();
    let mut buffer = [0u8; 64];
    let n = fifo.read(&mut buffer, 64).unwrap();

    assert_eq!(producer.join().unwrap(), 16);
    assert_eq!(&buffer[..n], b"through the fifo");
}

#[test]
fn fifo_async_read_until_writer_leaves() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("channel");
    Fifo::create(&path, 0o600).unwrap();

    let writer_path = path.clone();
    let producer = thread::spawn(move || {
        let fifo = Fifo::open(&writer_path, libc::O_WRONLY | libc::O_CLOEXEC).unwrap();
        fifo.write_str("abc").unwrap();
    });

    let fifo = Fifo::open(&path, libc::O_RDONLY | libc::O_CLOEXEC).unwrap();
    let (tx, rx) = mpsc::channel();

    fifo.async_read(Buffer::new(8), 8, move |buffer, n| {
        tx.send(buffer.as_slice()[..n].to_vec()).unwrap();
    })
    .unwrap();
    assert_eq!(fifo.worker_state(), WorkerState::Running);

    producer.join().unwrap();
    assert_eq!(rx.recv().unwrap(), b"abc");

    drop(fifo);
}
