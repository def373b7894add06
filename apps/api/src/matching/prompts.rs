// Match analysis and JD summary prompt templates.

use crate::llm_client::prompts::json_system;

pub const MATCH_ANALYSIS_BODY: &str = r#"Sos un analista experto en selección de talento técnico y de negocio.
Evaluá el nivel de match entre un PERFIL (en JSON) y una JOB DESCRIPTION (JD).

1) Analizá la JD: skills requeridas (must-have) y deseadas (nice-to-have), tipo de rol, seniority esperado, industria y keywords críticas.

2) Mapeá cada requerimiento contra el perfil completo (facts, capabilities, technologies, experience.raw, narrative, skills):
   - cubierto;
   - gap de framing: la skill existe con otro nombre o contexto;
   - gap estructural: no hay evidencia en el perfil.

3) Seniority: compará el nivel del rol con el del candidato (strategy.seniority, experience[].immutable.officialTitle, experience[].leadershipSignals) y reportalo SOLO en seniority_detected: "match" | "overqualified" | "underqualified". No ajustes el score por seniority.

4) Score técnico de 0 a 100, solo por cobertura de must-haves:
   - 90-100: cubre prácticamente todos los must-haves con evidencia directa.
   - 70-89: cubre la mayoría, con gaps menores o de framing.
   - 50-69: cubre algunos, con gaps estructurales en requerimientos críticos.
   - 0-49: los gaps estructurales superan claramente a los matches.
   No infles el score por soft skills ni por menciones tangenciales.

5) reasons_for: matches concretos, indicando qué pide la JD y qué parte del perfil lo respalda.

6) reasons_against: faltantes concretos, indicando en cada uno si es "gap estructural" o "gap de framing". Si el candidato es overqualified, agregá una razón explícita de gap de seniority.

Todo el texto va en español neutro, aunque la JD esté en otro idioma.

Forma exacta del JSON:
{
  "score": entero 0-100,
  "seniority_detected": "match" | "overqualified" | "underqualified",
  "reasons_for": ["..."],
  "reasons_against": ["..."],
  "recommendation": "postularse" | "no_postularse" | "postularse_con_reservas"
}
No agregues otros campos."#;

/// User prompt for the match call. Inputs are inserted verbatim, so text in
/// one that looks like a placeholder is never expanded.
pub fn match_analysis_prompt(profile_json: &str, jd_text: &str) -> String {
    format!(
        "PERFIL (JSON):\n{profile_json}\n\n\
         JOB DESCRIPTION (TEXTO PLANO):\n{jd_text}\n\n\
         Recordatorio: respondé SOLO con el JSON especificado."
    )
}

pub const JD_SUMMARY_SYSTEM: &str = "\
Resumís job descriptions en español: rol, requisitos must-have, nice-to-have y \
responsabilidades principales. Respuesta concisa en prosa o bullets.";

pub const JD_SUMMARY_PROMPT: &str = "Resumí esta oferta:\n\n{jd_text}";

pub fn match_analysis_system() -> String {
    json_system(MATCH_ANALYSIS_BODY)
}
