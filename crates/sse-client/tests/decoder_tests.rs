use sse_client::{FrameDecoder, SseFrame};

fn frame(event: &str, data: &str) -> SseFrame {
    SseFrame {
        event: event.to_string(),
        data: data.to_string(),
    }
}

#[test]
fn decodes_a_state_frame() {
    let mut decoder = FrameDecoder::default();
    let frames = decoder.push(b"event: state\ndata: {\"id\":\"x\",\"value\":1}\n\n");
    assert_eq!(frames, vec![frame("state", "{\"id\":\"x\",\"value\":1}")]);
}

#[test]
fn frames_without_event_field_default_to_message() {
    let mut decoder = FrameDecoder::default();
    let frames = decoder.push(b"data: hello\n\n");
    assert_eq!(frames, vec![frame("message", "hello")]);
}

#[test]
fn handles_crlf_line_endings() {
    let mut decoder = FrameDecoder::default();
    let frames = decoder.push(b"event: state\r\ndata: 1\r\n\r\n");
    assert_eq!(frames, vec![frame("state", "1")]);
}

#[test]
fn reassembles_lines_split_across_chunks() {
    let mut decoder = FrameDecoder::default();
    assert!(decoder.push(b"event: sta").is_empty());
    assert!(decoder.push(b"te\ndata: {\"id\"").is_empty());
    let frames = decoder.push(b":\"y\"}\n\n");
    assert_eq!(frames, vec![frame("state", "{\"id\":\"y\"}")]);
}

#[test]
fn joins_multi_line_data() {
    let mut decoder = FrameDecoder::default();
    let frames = decoder.push(b"data: one\ndata: two\n\n");
    assert_eq!(frames, vec![frame("message", "one\ntwo")]);
}

#[test]
fn skips_comment_lines_and_unknown_fields() {
    let mut decoder = FrameDecoder::default();
    let frames = decoder.push(b": keep-alive\nid: 42\nretry: 5000\ndata: x\n\n");
    assert_eq!(frames, vec![frame("message", "x")]);
}

#[test]
fn blank_line_without_data_emits_nothing_and_resets_the_event() {
    let mut decoder = FrameDecoder::default();
    assert!(decoder.push(b"event: ping\n\n").is_empty());

    // The pending event type must not leak into the next frame.
    let frames = decoder.push(b"data: x\n\n");
    assert_eq!(frames, vec![frame("message", "x")]);
}

#[test]
fn decodes_consecutive_frames_from_one_chunk() {
    let mut decoder = FrameDecoder::default();
    let frames = decoder.push(b"event: ping\ndata: a\n\nevent: state\ndata: b\n\n");
    assert_eq!(frames, vec![frame("ping", "a"), frame("state", "b")]);
}

#[test]
fn data_without_space_after_colon_is_kept() {
    let mut decoder = FrameDecoder::default();
    let frames = decoder.push(b"data:compact\n\n");
    assert_eq!(frames, vec![frame("message", "compact")]);
}
