//! HTML email templates
//!
//! Templates carry `${placeholder}` markers that get substituted before
//! sending. Copy is in Spanish to match the storefront.

pub const WELCOME_SUBJECT: &str = "Bienvenido a SmartStay: Confirmar email";
pub const PASSWORD_UPDATED_SUBJECT: &str = "SmartStay: Contraseña actualizada";

pub const WELCOME_TEMPLATE: &str = r#"<html>
<body style="font-family: Arial, sans-serif; color: #333;">
  <h1>Hola ${name},</h1>
  <p>Gracias por registrarte en <strong>SmartStay</strong>.</p>
  <p>Para activar tu cuenta, confirma tu direccion de email haciendo clic en el siguiente enlace:</p>
  <p><a href="${confirmationLink}">Confirmar mi email</a></p>
  <p>Si no creaste esta cuenta, puedes ignorar este mensaje.</p>
  <p>El equipo de SmartStay</p>
</body>
</html>"#;

pub const PASSWORD_UPDATED_TEMPLATE: &str = r#"<html>
<body style="font-family: Arial, sans-serif; color: #333;">
  <h1>Hola ${name},</h1>
  <p>Tu contraseña de <strong>SmartStay</strong> ha sido actualizada correctamente.</p>
  <p>Si no realizaste este cambio, ponte en contacto con nosotros de inmediato.</p>
  <p>El equipo de SmartStay</p>
</body>
</html>"#;

/// Replace every `${key}` marker with its value
pub fn render(template: &str, substitutions: &[(&str, &str)]) -> String {
    let mut out = template.to_string();
    for (key, value) in substitutions {
        out = out.replace(&format!("${{{}}}", key), value);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_substitutes_all_markers() {
        let html = render(
            WELCOME_TEMPLATE,
            &[
                ("name", "Ana"),
                ("confirmationLink", "http://localhost:8080/api/users/confirm/tok"),
            ],
        );
        assert!(html.contains("Hola Ana,"));
        assert!(html.contains("http://localhost:8080/api/users/confirm/tok"));
        assert!(!html.contains("${"));
    }

    #[test]
    fn render_ignores_unknown_keys() {
        let html = render("hi ${name}", &[("other", "x")]);
        assert_eq!(html, "hi ${name}");
    }
}
