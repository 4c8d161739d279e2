//! Human-readable findings derived from a snapshot and its score.

use serde::{Deserialize, Serialize};

use crate::core::scoring::{ScoreBand, FAST_LOAD_THRESHOLD_SECS};
use crate::core::snapshot::SecuritySnapshot;
use crate::core::{Locale, Priority, Severity};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vulnerability {
    pub severity: Severity,
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    pub description: String,
    pub impact: String,
    pub solution: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    pub priority: Priority,
    pub category: String,
    pub title: String,
    pub description: String,
}

const TRANSPORT_TYPE: &str = "Transport Layer Security";
const HEADERS_TYPE: &str = "Security Headers";

fn vulnerability(
    severity: Severity,
    kind: &str,
    title: &str,
    description: &str,
    impact: &str,
    solution: &str,
) -> Vulnerability {
    Vulnerability {
        severity,
        kind: kind.to_string(),
        title: title.to_string(),
        description: description.to_string(),
        impact: impact.to_string(),
        solution: solution.to_string(),
    }
}

fn recommendation(priority: Priority, category: &str, title: &str, description: &str) -> Recommendation {
    Recommendation {
        priority,
        category: category.to_string(),
        title: title.to_string(),
        description: description.to_string(),
    }
}

/// Vulnerabilities in fixed check order: transport, HSTS, X-Frame-Options, CSP.
pub fn generate_vulnerabilities(snapshot: &SecuritySnapshot, locale: Locale) -> Vec<Vulnerability> {
    let mut vulnerabilities = Vec::new();

    if !snapshot.https {
        vulnerabilities.push(vulnerability(
            Severity::Critical,
            TRANSPORT_TYPE,
            locale.pick("Insecure site (HTTP)", "Site non sécurisé (HTTP)"),
            locale.pick(
                "The site does not use HTTPS, exposing data in transit.",
                "Le site n'utilise pas HTTPS, exposant les données en transit.",
            ),
            locale.pick(
                "Data can be intercepted by attackers.",
                "Les données peuvent être interceptées par des attaquants.",
            ),
            locale.pick(
                "Serve the site over HTTPS with a valid SSL certificate.",
                "Implémenter HTTPS avec un certificat SSL valide.",
            ),
        ));
    }

    if !snapshot.headers.strict_transport_security {
        vulnerabilities.push(vulnerability(
            Severity::High,
            HEADERS_TYPE,
            locale.pick("Missing HSTS header", "Header HSTS manquant"),
            locale.pick(
                "The Strict-Transport-Security header is not configured.",
                "Le header Strict-Transport-Security n'est pas configuré.",
            ),
            locale.pick(
                "Vulnerable to SSL downgrade attacks.",
                "Vulnérable aux attaques de downgrade SSL.",
            ),
            locale.pick(
                "Add the HSTS header with a max-age of at least 31536000 seconds.",
                "Ajouter le header HSTS avec une durée minimale de 31536000 secondes.",
            ),
        ));
    }

    if !snapshot.headers.x_frame_options {
        vulnerabilities.push(vulnerability(
            Severity::Medium,
            HEADERS_TYPE,
            locale.pick("Missing clickjacking protection", "Protection Clickjacking manquante"),
            locale.pick(
                "The X-Frame-Options header is not set.",
                "Le header X-Frame-Options n'est pas défini.",
            ),
            locale.pick(
                "The site can be embedded in a malicious iframe.",
                "Le site peut être intégré dans une iframe malveillante.",
            ),
            locale.pick(
                "Add X-Frame-Options: DENY or SAMEORIGIN.",
                "Ajouter X-Frame-Options: DENY ou SAMEORIGIN.",
            ),
        ));
    }

    if !snapshot.headers.content_security_policy {
        vulnerabilities.push(vulnerability(
            Severity::Medium,
            HEADERS_TYPE,
            locale.pick("CSP not configured", "CSP non configuré"),
            locale.pick(
                "No Content Security Policy is defined.",
                "Aucune Content Security Policy n'est définie.",
            ),
            locale.pick("Vulnerable to XSS attacks.", "Vulnérable aux attaques XSS."),
            locale.pick(
                "Deploy a restrictive Content Security Policy.",
                "Implémenter une CSP restrictive.",
            ),
        ));
    }

    vulnerabilities
}

/// Three standing recommendations, plus a performance one for slow targets.
pub fn generate_recommendations(snapshot: &SecuritySnapshot, locale: Locale) -> Vec<Recommendation> {
    let mut recommendations = vec![
        recommendation(
            Priority::High,
            "Infrastructure",
            locale.pick("Use a WAF", "Utiliser un WAF"),
            locale.pick(
                "Deploy a Web Application Firewall to filter malicious traffic.",
                "Implémenter un Web Application Firewall pour filtrer le trafic malveillant.",
            ),
        ),
        recommendation(
            Priority::Medium,
            "Monitoring",
            locale.pick("Set up monitoring", "Mettre en place un monitoring"),
            locale.pick(
                "Use tools such as Sentry or DataDog to track errors and performance.",
                "Utiliser des outils comme Sentry ou DataDog pour surveiller les erreurs et performances.",
            ),
        ),
        recommendation(
            Priority::Medium,
            "Authentication",
            locale.pick("Enable 2FA", "Implémenter 2FA"),
            locale.pick(
                "Add two-factor authentication for user accounts.",
                "Ajouter l'authentification à deux facteurs pour les comptes utilisateurs.",
            ),
        ),
    ];

    if snapshot.performance.load_time_seconds > FAST_LOAD_THRESHOLD_SECS {
        recommendations.push(recommendation(
            Priority::Low,
            "Performance",
            locale.pick("Optimize performance", "Optimiser les performances"),
            locale.pick(
                "Reduce load time by optimizing resources.",
                "Réduire le temps de chargement en optimisant les ressources.",
            ),
        ));
    }

    recommendations
}

/// Five ordered steps: three picked by score band, then two closing steps.
pub fn generate_next_steps(score: u8, locale: Locale) -> Vec<String> {
    let band_steps: [&str; 3] = match ScoreBand::for_score(score) {
        ScoreBand::Critical => [
            locale.pick(
                "1. Fix critical vulnerabilities immediately",
                "1. Corriger immédiatement les vulnérabilités critiques",
            ),
            locale.pick(
                "2. Enable HTTPS if not already done",
                "2. Implémenter HTTPS si ce n'est pas déjà fait",
            ),
            locale.pick(
                "3. Configure the essential security headers",
                "3. Configurer les headers de sécurité essentiels",
            ),
        ],
        ScoreBand::Moderate => [
            locale.pick(
                "1. Harden the security configuration",
                "1. Renforcer la configuration de sécurité",
            ),
            locale.pick(
                "2. Set up continuous monitoring",
                "2. Mettre en place un monitoring continu",
            ),
            locale.pick(
                "3. Run regular penetration tests",
                "3. Effectuer des tests de pénétration réguliers",
            ),
        ],
        ScoreBand::Strong => [
            locale.pick(
                "1. Keep up current good practices",
                "1. Maintenir les bonnes pratiques actuelles",
            ),
            locale.pick("2. Run regular audits", "2. Effectuer des audits réguliers"),
            locale.pick(
                "3. Stay informed about new threats",
                "3. Rester informé des nouvelles menaces",
            ),
        ],
    };

    let closing = [
        locale.pick(
            "4. Train the team on security best practices",
            "4. Former l'équipe aux bonnes pratiques de sécurité",
        ),
        locale.pick(
            "5. Document security procedures",
            "5. Documenter les procédures de sécurité",
        ),
    ];

    band_steps
        .iter()
        .chain(closing.iter())
        .map(|step| step.to_string())
        .collect()
}
