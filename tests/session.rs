use nntpsink::config::Caps;
use nntpsink::queue::ByteQueue;
use nntpsink::session::{Flow, Session, State};

const BOTH: Caps = Caps {
    ihave: true,
    streaming: true,
};
const IHAVE_ONLY: Caps = Caps {
    ihave: true,
    streaming: false,
};
const STREAMING_ONLY: Caps = Caps {
    ihave: false,
    streaming: true,
};

/// Feed lines to a fresh session, returning everything it emitted.
/// Panics if any line asks for a hangup.
fn converse(caps: Caps, lines: &[&[u8]]) -> Vec<u8> {
    let mut session = Session::new(caps);
    let mut out = ByteQueue::new();
    for line in lines {
        assert_eq!(session.handle_line(line, &mut out), Flow::Continue);
    }
    out.as_bytes().to_vec()
}

#[test]
fn capabilities_advertises_enabled_features() {
    let out = converse(BOTH, &[b"CAPABILITIES"]);
    let expected = format!(
        "101 Capability list:\r\nVERSION 2\r\nIMPLEMENTATION nntpsink {}\r\nIHAVE\r\nSTREAMING\r\n.\r\n",
        nntpsink::VERSION
    );
    assert_eq!(out, expected.into_bytes());
}

#[test]
fn mode_stream() {
    assert_eq!(converse(BOTH, &[b"MODE STREAM"]), b"203 Streaming OK.\r\n");
    assert_eq!(converse(BOTH, &[b"mode stream"]), b"203 Streaming OK.\r\n");
    assert_eq!(converse(BOTH, &[b"MODE READER"]), b"501 Unknown MODE.\r\n");
    assert_eq!(converse(BOTH, &[b"MODE"]), b"501 Unknown MODE.\r\n");
    // streaming disabled: MODE STREAM is an unknown mode, not an
    // unknown command
    assert_eq!(
        converse(IHAVE_ONLY, &[b"MODE STREAM"]),
        b"501 Unknown MODE.\r\n"
    );
}

#[test]
fn check_replies_send_it() {
    assert_eq!(converse(BOTH, &[b"CHECK <a@b>"]), b"238 <a@b>\r\n");
    assert_eq!(converse(BOTH, &[b"CHECK"]), b"501 Missing message-id.\r\n");
    assert_eq!(
        converse(IHAVE_ONLY, &[b"CHECK <a@b>"]),
        b"500 Unknown command.\r\n"
    );
}

#[test]
fn takethis_swallows_article_then_accepts() {
    let out = converse(
        BOTH,
        &[b"TAKETHIS <a@b>", b"Header: x", b"", b"body", b"."],
    );
    assert_eq!(out, b"239 <a@b>\r\n");
}

#[test]
fn takethis_with_empty_body() {
    assert_eq!(
        converse(BOTH, &[b"TAKETHIS <a@b>", b"."]),
        b"239 <a@b>\r\n"
    );
}

#[test]
fn takethis_requires_message_id_and_streaming() {
    assert_eq!(
        converse(BOTH, &[b"TAKETHIS"]),
        b"501 Missing message-id.\r\n"
    );
    assert_eq!(
        converse(IHAVE_ONLY, &[b"TAKETHIS <a@b>"]),
        b"500 Unknown command.\r\n"
    );
}

#[test]
fn ihave_full_exchange() {
    let out = converse(BOTH, &[b"IHAVE <c@d>", b"body", b"."]);
    assert_eq!(out, b"335 <c@d>\r\n235 <c@d>\r\n");
}

#[test]
fn ihave_disabled_by_streaming_only() {
    assert_eq!(
        converse(STREAMING_ONLY, &[b"IHAVE <c@d>"]),
        b"500 Unknown command.\r\n"
    );
}

#[test]
fn dot_stuffing_is_not_unescaped() {
    // ".." is article content, not a terminator; only a lone "." ends
    // the article
    let out = converse(BOTH, &[b"TAKETHIS <a@b>", b"..", b". leading", b"."]);
    assert_eq!(out, b"239 <a@b>\r\n");
}

#[test]
fn unknown_command() {
    assert_eq!(converse(BOTH, &[b"FOO"]), b"500 Unknown command.\r\n");
}

#[test]
fn quit_hangs_up_without_a_response() {
    let mut session = Session::new(BOTH);
    let mut out = ByteQueue::new();
    assert_eq!(session.handle_line(b"QUIT", &mut out), Flow::Hangup);
    assert!(out.is_empty());
}

#[test]
fn message_id_exists_exactly_in_article_states() {
    let mut session = Session::new(BOTH);
    let mut out = ByteQueue::new();
    assert_eq!(session.state(), State::Normal);
    assert!(session.msgid().is_none());

    session.handle_line(b"TAKETHIS <a@b>", &mut out);
    assert_eq!(session.state(), State::TakeThis);
    assert_eq!(session.msgid(), Some("<a@b>"));

    session.handle_line(b"body", &mut out);
    assert_eq!(session.state(), State::TakeThis);

    session.handle_line(b".", &mut out);
    assert_eq!(session.state(), State::Normal);
    assert!(session.msgid().is_none());

    session.handle_line(b"IHAVE <c@d>", &mut out);
    assert_eq!(session.state(), State::Ihave);
    assert_eq!(session.msgid(), Some("<c@d>"));

    session.handle_line(b".", &mut out);
    assert_eq!(session.state(), State::Normal);
    assert!(session.msgid().is_none());
}

#[test]
fn protocol_errors_do_not_change_state() {
    let mut session = Session::new(BOTH);
    let mut out = ByteQueue::new();
    for line in [&b"FOO"[..], b"CHECK", b"MODE X", b"TAKETHIS", b"IHAVE"] {
        assert_eq!(session.handle_line(line, &mut out), Flow::Continue);
        assert_eq!(session.state(), State::Normal);
        assert!(session.msgid().is_none());
    }
}

#[test]
fn response_vocabulary_is_closed_under_junk_input() {
    let junk: &[&[u8]] = &[
        b"",
        b"   ",
        b"\x00\x01\x02",
        b"HELO there",
        b"ARTICLE <x@y>",
        b"check\xffstuck",
        b"MODE \xc3\x28",
        b"XOVER 1-100",
        b"!!!!",
    ];
    let out = converse(BOTH, junk);
    let text = String::from_utf8(out).unwrap();
    for line in text.split_terminator("\r\n") {
        assert!(
            line == "500 Unknown command." || line == "501 Unknown MODE.",
            "unexpected response line: {line:?}"
        );
    }
}
