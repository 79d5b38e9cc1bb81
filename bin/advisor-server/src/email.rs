//! Inquiry email rendering.
//!
//! Every interpolated field goes through [`escape_html`] before it reaches
//! the template; the template itself does no escaping of its own.

use advisor_core::InquiryRequest;
use advisor_core::html::escape_html;
use minijinja::{AutoEscape, Environment, context};

use crate::upstream::EmailMessage;

const INQUIRY_TEMPLATE: &str = r#"
      <div style="font-family: system-ui, -apple-system, sans-serif; max-width: 600px; margin: 0 auto;">
        <h2 style="color: #1e40af; border-bottom: 2px solid #3b82f6; padding-bottom: 12px;">
          {{ heading }}
        </h2>

        <div style="background: #f8fafc; padding: 20px; border-radius: 8px; margin: 20px 0;">
          <p style="margin: 0 0 8px 0;"><strong>From:</strong> {{ name }}</p>
          <p style="margin: 0 0 8px 0;"><strong>Email:</strong> <a href="mailto:{{ email }}">{{ email }}</a></p>
          <p style="margin: 0;"><strong>Type:</strong> {{ kind }}</p>
        </div>

        <div style="margin: 20px 0;">
          <h3 style="color: #374151; margin-bottom: 12px;">Message:</h3>
          <div style="background: #fff; border: 1px solid #e5e7eb; padding: 16px; border-radius: 8px; white-space: pre-wrap;">
{{ message }}
          </div>
        </div>
{% if context %}
        <div style="margin: 20px 0;">
          <h3 style="color: #374151; margin-bottom: 12px;">Chat Context:</h3>
          <div style="background: #fefce8; border: 1px solid #fde047; padding: 16px; border-radius: 8px; font-size: 14px; white-space: pre-wrap;">
{{ context }}
          </div>
        </div>
{% endif %}
        <hr style="border: none; border-top: 1px solid #e5e7eb; margin: 24px 0;">
        <p style="color: #6b7280; font-size: 12px;">
          This message was sent via the AI chatbot on your website.
        </p>
      </div>
"#;

fn environment() -> Result<Environment<'static>, minijinja::Error> {
    let mut env = Environment::new();
    // Fields are pre-escaped with the site's entity set.
    env.set_auto_escape_callback(|_| AutoEscape::None);
    env.add_template("inquiry", INQUIRY_TEMPLATE)?;
    Ok(env)
}

/// Build the subject and HTML body for a validated inquiry.
pub fn render_inquiry(inquiry: &InquiryRequest) -> Result<EmailMessage, minijinja::Error> {
    let name = escape_html(&inquiry.name);
    let env = environment()?;
    let html = env.get_template("inquiry")?.render(context! {
        heading => inquiry.kind.heading(),
        kind => inquiry.kind.label(),
        name => &name,
        email => escape_html(&inquiry.email),
        message => escape_html(&inquiry.message),
        context => inquiry.context.as_deref().map(escape_html),
    })?;

    Ok(EmailMessage {
        subject: format!("{} from {}", inquiry.kind.subject_prefix(), name),
        html,
        reply_to: inquiry.email.clone(),
    })
}
