use fdio::{Buffer, Error, File, Pipe};
use std::thread;

fn pattern(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}

#[test]
fn pipe_round_trip_single_byte() {
    let pipe = Pipe::new().unwrap();

    assert_eq!(pipe.write(b"z", 1).unwrap(), 1);

    let mut buffer = [0u8; 1];
    assert_eq!(pipe.read(&mut buffer, 1).unwrap(), 1);
    assert_eq!(&buffer, b"z");
}

#[test]
fn pipe_round_trip_larger_than_pipe_buffer() {
    const LEN: usize = 1 << 20;

    let (reader, writer) = Pipe::new().unwrap().into_parts();
    let data = pattern(LEN);

    let producer = {
        let data = data.clone();
        thread::spawn(move || writer.write(&data, LEN).unwrap())
    };

    // A single read(2) never returns a whole megabyte from a pipe.
    let mut received = vec![0u8; LEN];
    assert_eq!(reader.read(&mut received, LEN).unwrap(), LEN);

    assert_eq!(producer.join().unwrap(), LEN);
    assert_eq!(received, data);
}

#[test]
fn zero_sized_buffer_is_rejected_up_front() {
    let pipe = Pipe::new().unwrap();

    let mut empty = [0u8; 0];
    assert!(matches!(
        pipe.read(&mut empty, 0),
        Err(Error::BufferTooSmall { capacity: 0, .. })
    ));
    assert!(matches!(
        pipe.write(&[], 0),
        Err(Error::BufferTooSmall { capacity: 0, .. })
    ));
}

#[test]
fn request_larger_than_buffer_is_rejected() {
    let pipe = Pipe::new().unwrap();
    pipe.write_str("abc").unwrap();

    let mut buffer = Buffer::new(2);
    assert!(matches!(
        pipe.reader().read_buffer(&mut buffer, 3),
        Err(Error::BufferTooSmall {
            requested: 3,
            capacity: 2
        })
    ));

    // The descriptor was not touched.
    let mut buffer = [0u8; 3];
    assert_eq!(pipe.read(&mut buffer, 3).unwrap(), 3);
    assert_eq!(&buffer, b"abc");
}

#[test]
fn short_read_at_end_of_stream() {
    let (reader, writer) = Pipe::new().unwrap().into_parts();
    writer.write_str("four").unwrap();
    writer.close().unwrap();

    let mut buffer = [0u8; 16];
    assert_eq!(reader.read(&mut buffer, 16).unwrap(), 4);
    assert_eq!(&buffer[..4], b"four");
}

#[test]
fn reading_a_write_only_end_is_a_transfer_error() {
    let pipe = Pipe::new().unwrap();

    let mut buffer = [0u8; 4];
    let err = pipe.writer().read(&mut buffer, 4).unwrap_err();

    match err {
        Error::Transfer {
            op, transferred, ..
        } => {
            assert_eq!(op, "read");
            assert_eq!(transferred, 0);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("round-trip.bin");
    let data = pattern(100_000);

    let writer = File::create(&path).unwrap();
    assert_eq!(writer.write(&data, data.len()).unwrap(), data.len());
    assert_eq!(writer.len().unwrap(), data.len() as u64);
    writer.into_descriptor().close().unwrap();

    let reader = File::open(&path, libc::O_RDONLY).unwrap();
    let mut buffer = Buffer::new(data.len() + 10);
    assert_eq!(reader.read_buffer(&mut buffer, data.len() + 10).unwrap(), data.len());
    assert!(buffer.compare(&data, data.len()));
}

#[test]
fn buffers_survive_the_round_trip() {
    let pipe = Pipe::new().unwrap();

    let mut out = Buffer::new(8);
    out.fill(b"payload!").unwrap();
    assert_eq!(pipe.writer().write_buffer(&out, 8).unwrap(), 8);

    let mut back = Buffer::new(8);
    assert_eq!(pipe.reader().read_buffer(&mut back, 8).unwrap(), 8);
    assert_eq!(back, out);
}

#[test]
fn cloned_descriptor_outlives_its_source() {
    let (reader, writer) = Pipe::new().unwrap().into_parts();
    let copy = writer.try_clone().unwrap();
    drop(writer);

    copy.write_str("still open").unwrap();
    drop(copy);

    let mut buffer = [0u8; 32];
    assert_eq!(reader.read(&mut buffer, 32).unwrap(), 10);
    assert_eq!(&buffer[..10], b"still open");
}
