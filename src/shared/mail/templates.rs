use super::MailMessage;

pub fn otp(to: &str, code: &str) -> MailMessage {
    MailMessage {
        to: to.to_string(),
        subject: "OTP for Registration".to_string(),
        text: format!("Your OTP is: {code}\nIt expires in 10 minutes."),
        html: format!(
            "<p>Your OTP is: <strong>{code}</strong></p>\n<p>It expires in 10 minutes.</p>"
        ),
    }
}

pub fn password_reset(to: &str, reset_url: &str) -> MailMessage {
    MailMessage {
        to: to.to_string(),
        subject: "Password Reset Request".to_string(),
        text: format!("Reset your password: {reset_url}\nThis link will expire in 1 hour."),
        html: format!(
            "<p>Click <a href=\"{reset_url}\">here</a> to reset your password.</p>\n<p>This link will expire in 1 hour.</p>"
        ),
    }
}
