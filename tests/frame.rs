use roomcast::protocol::frame::{encode_message, read_frame};
use roomcast::protocol::messages::{CmChat, CmLogin, WireMessage};

#[tokio::test]
async fn round_trips_through_the_wire() {
    let original = CmLogin {
        nickname: "alice".to_string(),
        send_time: 1_700_000_000,
    };
    let frame = encode_message(&original).unwrap();

    let mut cursor = std::io::Cursor::new(frame.to_vec());
    let raw = read_frame(&mut cursor).await.unwrap();

    assert_eq!(raw.name, CmLogin::NAME);
    let decoded: CmLogin = bincode::deserialize(&raw.body).unwrap();
    assert_eq!(decoded, original);
}

#[tokio::test]
async fn reads_multiple_frames_back_to_back() {
    let a = CmChat {
        content: "hi".to_string(),
        send_time: 1,
    };
    let b = CmChat {
        content: "there".to_string(),
        send_time: 2,
    };

    let mut buf = Vec::new();
    buf.extend_from_slice(&encode_message(&a).unwrap());
    buf.extend_from_slice(&encode_message(&b).unwrap());

    let mut cursor = std::io::Cursor::new(buf);
    let raw_a = read_frame(&mut cursor).await.unwrap();
    let raw_b = read_frame(&mut cursor).await.unwrap();

    let decoded_a: CmChat = bincode::deserialize(&raw_a.body).unwrap();
    let decoded_b: CmChat = bincode::deserialize(&raw_b.body).unwrap();
    assert_eq!(decoded_a, a);
    assert_eq!(decoded_b, b);
}

#[tokio::test]
async fn eof_on_empty_stream() {
    let mut cursor = std::io::Cursor::new(Vec::new());
    let err = read_frame(&mut cursor).await.unwrap_err();
    assert!(matches!(err, roomcast::error::WireError::Eof));
}
