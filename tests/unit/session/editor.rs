use super::*;

#[test]
fn output_name_uses_the_input_stem() {
    assert_eq!(output_filename(Some("me.png")), "me-dealwithit.gif");
    assert_eq!(
        output_filename(Some("/tmp/photos/party.final.jpeg")),
        "party.final-dealwithit.gif"
    );
    assert_eq!(output_filename(Some("noext")), "noext-dealwithit.gif");
}

#[test]
fn output_name_falls_back_without_a_stem() {
    assert_eq!(output_filename(None), FALLBACK_OUTPUT_NAME);
    assert_eq!(output_filename(Some("")), FALLBACK_OUTPUT_NAME);
}

#[test]
fn success_messages_rotate() {
    assert_eq!(success_message(1), SUCCESS_MESSAGES[0]);
    assert_eq!(success_message(2), SUCCESS_MESSAGES[1]);
    assert_eq!(
        success_message(SUCCESS_MESSAGES.len() as u64 + 1),
        SUCCESS_MESSAGES[0]
    );
    assert_eq!(success_message(0), SUCCESS_MESSAGES[0]);
}
