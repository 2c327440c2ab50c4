use page_helpers::{ConfirmPrompt, Locale, Page, Result, confirm_action};

#[test]
fn default_prompt_is_shown_when_message_is_missing() -> Result<()> {
    let mut page = Page::from_html("<button id='delete'>Delete</button>")?;
    page.enqueue_confirm_response(true);
    assert!(page.confirm_action(None));
    assert_eq!(
        page.take_confirm_messages(),
        vec!["Tem certeza que deseja continuar?".to_string()]
    );
    Ok(())
}

#[test]
fn empty_message_counts_as_missing() -> Result<()> {
    let mut page = Page::from_html("<p></p>")?;
    page.enqueue_confirm_response(true);
    assert!(confirm_action(&mut page, Some("")));
    assert_eq!(
        page.take_confirm_messages(),
        vec!["Tem certeza que deseja continuar?".to_string()]
    );
    Ok(())
}

#[test]
fn user_answer_is_returned_unchanged() -> Result<()> {
    let mut page = Page::from_html("<p></p>")?;
    page.enqueue_confirm_response(true);
    page.enqueue_confirm_response(false);
    assert!(page.confirm_action(Some("Delete this record?")));
    assert!(!page.confirm_action(Some("Delete this record?")));
    // Queue exhausted: the dialog counts as dismissed.
    assert!(!page.confirm_action(Some("Delete this record?")));

    page.set_default_confirm_response(true);
    assert!(page.confirm_action(Some("Archive?")));
    assert_eq!(page.take_confirm_messages().len(), 4);
    Ok(())
}

#[test]
fn english_prompt_uses_english_default() -> Result<()> {
    let mut page = Page::from_html("<p></p>")?;
    let prompt = ConfirmPrompt::new(Locale::En);
    assert!(!prompt.ask(&mut page, None));
    assert_eq!(
        page.take_confirm_messages(),
        vec!["Are you sure you want to continue?".to_string()]
    );
    Ok(())
}

#[test]
fn submit_flow_validates_before_confirming() -> Result<()> {
    let html = r#"
        <form id="remove-account">
          <input id="reason" required>
          <button type="submit">Remove</button>
        </form>
        "#;
    let mut page = Page::from_html(html)?;
    page.set_default_confirm_response(true);

    let submitted = page.validate_form("remove-account") && page.confirm_action(None);
    assert!(!submitted);
    assert!(page.take_confirm_messages().is_empty());

    page.type_text("#reason", "moving away")?;
    let submitted = page.validate_form("remove-account")
        && page.confirm_action(Some("Remove your account?"));
    assert!(submitted);
    assert_eq!(
        page.take_confirm_messages(),
        vec!["Remove your account?".to_string()]
    );
    Ok(())
}
