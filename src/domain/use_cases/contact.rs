use std::sync::Arc;

use chrono::{Datelike, Utc};
use validator::Validate;

use crate::{
    entities::contact::{ContactForm, ContactResponse},
    errors::AppError,
    limiter::RateLimiter,
    mail::{Mailer, OutgoingEmail},
    settings::AppConfig,
};

pub const CONTACT_SUCCESS_MESSAGE: &str = "Thank you for your message! We'll be in touch soon.";

#[derive(Debug, Clone)]
pub struct ContactSettings {
    pub site_name: String,
    pub site_url: String,
    pub contact_email: String,
    pub email_from: String,
}

impl From<&AppConfig> for ContactSettings {
    fn from(config: &AppConfig) -> Self {
        ContactSettings {
            site_name: config.site_name.clone(),
            site_url: config.site_url.clone(),
            contact_email: config.contact_email.clone(),
            email_from: config.email_from.clone(),
        }
    }
}

/// Escapes user text for an HTML body, keeping line breaks.
fn html_text(raw: &str) -> String {
    raw.lines()
        .map(ammonia::clean_text)
        .collect::<Vec<_>>()
        .join("<br>")
}

pub struct ContactHandler {
    pub limiter: Arc<dyn RateLimiter>,
    pub mailer: Arc<dyn Mailer>,
    pub settings: ContactSettings,
}

impl ContactHandler {
    pub fn new(limiter: Arc<dyn RateLimiter>, mailer: Arc<dyn Mailer>, settings: ContactSettings) -> Self {
        ContactHandler { limiter, mailer, settings }
    }

    /// Rate limit, honeypot, validation, then both emails. Every attempt
    /// counts against the sender's window, including rejected ones.
    pub async fn submit(&self, client_ip: &str, form: ContactForm) -> Result<ContactResponse, AppError> {
        if !self.limiter.check(client_ip).await {
            tracing::warn!(client_ip, "Contact form rate limit exceeded");
            return Err(AppError::RateLimited);
        }

        if form.is_spam() {
            tracing::info!(client_ip, "Honeypot filled, dropping contact submission");
            return Ok(ContactResponse { success: true, message: None });
        }

        form.validate()?;

        self.mailer.send(&self.notification(&form)).await?;
        self.mailer.send(&self.auto_reply(&form)).await?;

        tracing::info!(client_ip, "Contact message delivered");
        Ok(ContactResponse {
            success: true,
            message: Some(CONTACT_SUCCESS_MESSAGE.to_string()),
        })
    }

    /// Message to the site owner. Replies go straight to the sender.
    fn notification(&self, form: &ContactForm) -> OutgoingEmail {
        let sent_at = Utc::now().format("%Y-%m-%d %H:%M UTC");
        let site = &self.settings.site_name;

        let html = format!(
            r#"<!DOCTYPE html>
<html>
  <body style="font-family: Arial, sans-serif; line-height: 1.6; color: #333;">
    <div style="max-width: 600px; margin: 0 auto; padding: 20px;">
      <h2 style="background-color: #00796B; color: white; padding: 20px; text-align: center;">New Contact Form Submission</h2>
      <p><strong>Name:</strong> {name}</p>
      <p><strong>Email:</strong> {email}</p>
      <p><strong>Subject:</strong> {subject}</p>
      <p><strong>Message:</strong><br>{message}</p>
      <p style="font-size: 12px; color: #666;">This email was sent from the {site} contact form.<br>Time: {sent_at}</p>
    </div>
  </body>
</html>"#,
            name = html_text(&form.name),
            email = html_text(&form.email),
            subject = html_text(&form.subject),
            message = html_text(&form.message),
            site = ammonia::clean_text(site),
        );

        let text = format!(
            "New Contact Form Submission\n\nName: {}\nEmail: {}\nSubject: {}\n\nMessage:\n{}\n\n---\nThis email was sent from the {} contact form.\nTime: {}\n",
            form.name, form.email, form.subject, form.message, site, sent_at
        );

        OutgoingEmail {
            from: format!("{} Contact <{}>", site, self.settings.email_from),
            to: vec![self.settings.contact_email.clone()],
            reply_to: Some(form.email.clone()),
            subject: format!("[Contact Form] {}", form.subject),
            html,
            text,
        }
    }

    fn auto_reply(&self, form: &ContactForm) -> OutgoingEmail {
        let site = &self.settings.site_name;
        let url = &self.settings.site_url;
        let year = Utc::now().year();

        let html = format!(
            r#"<!DOCTYPE html>
<html>
  <body style="font-family: Arial, sans-serif; line-height: 1.6; color: #333;">
    <div style="max-width: 600px; margin: 0 auto; padding: 20px;">
      <h1 style="background-color: #00796B; color: white; padding: 30px; text-align: center;">Thank You for Reaching Out!</h1>
      <p>Hi {name},</p>
      <p>Thank you for contacting {site}. I've received your message and will get back to you within 24-48 hours.</p>
      <p>In the meantime, feel free to browse my portfolio at <a href="{url}">{url}</a>.</p>
      <p>Best regards,<br>{site}</p>
      <p style="font-size: 12px; color: #666; text-align: center;">&copy; {year} {site}. All rights reserved.</p>
    </div>
  </body>
</html>"#,
            name = html_text(&form.name),
            site = ammonia::clean_text(site),
            url = url,
            year = year,
        );

        let text = format!(
            "Hi {},\n\nThank you for contacting {}. I've received your message and will get back to you within 24-48 hours.\n\nIn the meantime, feel free to browse my portfolio at {}.\n\nBest regards,\n{}\n\n---\n© {} {}. All rights reserved.\n",
            form.name, site, url, site, year, site
        );

        OutgoingEmail {
            from: format!("{} <{}>", site, self.settings.email_from),
            to: vec![form.email.clone()],
            reply_to: None,
            subject: format!("Thank you for contacting {}", site),
            html,
            text,
        }
    }
}
