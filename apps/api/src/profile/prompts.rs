// Enrichment prompt templates.
// The constraint lists quoted here are informational: the result is pinned
// locally after every pass.

use crate::llm_client::prompts::{json_system, NO_INVENTION_INSTRUCTION};

pub const EXPERIENCE_ENRICH_BODY: &str = r#"Sos un asistente que enriquece perfiles profesionales. Recibís el "raw" de una experiencia laboral y el contexto del rol (immutable, context). Tu tarea es devolver los campos que se indican, inferidos del texto.

Reglas:
- facts: array de { "what": string, "metric": number o null, "scope": string, "myRole": "owner" | "contributor" | "support" }. myRole solo puede ser uno de esos tres.
- capabilities: array de { "name": string, "evidence": array de strings }.
- technologies: array de { "name": string, "yearsInThisRole": number, "usedInProduction": boolean, "depth": "architecture" | "implementation" | "basic", "contexts": array de strings }.
- leadershipSignals: { "mentored": number, "ledProjects": boolean, "hiringInvolvement": boolean, "crossFunctional": boolean }. Si no hay evidencia, usá false o 0.
- relevanceTags: array de strings (etiquetas que describan el rol para matching).

El JSON debe tener exactamente estas claves: facts, capabilities, technologies, leadershipSignals, relevanceTags."#;

pub const STRATEGY_ENRICH_BODY: &str = r#"Sos un asistente que completa la sección constraints y strategy de un perfil profesional. Recibís un resumen del perfil en JSON.

Reglas:
- constraints.cannotModify es exactamente ["dates", "companies", "officialTitle", "technologies", "educationDegrees"].
- constraints.canReframe es exactamente ["achievements", "summary", "bulletOrdering", "skillHighlighting", "capabilityEmphasis", "headline"].
- strategy: inferí del perfil (experiencias, narrative, skills) un objeto con targetRoles (array de strings), avoidRoles (array), seniority ("mid" | "senior" | "staff"), workMode ("remoto" | "híbrido" | "presencial"), industries (array).

El JSON debe tener exactamente dos claves: constraints, strategy."#;

pub fn experience_enrich_system() -> String {
    json_system(&format!("{EXPERIENCE_ENRICH_BODY}\n\n{NO_INVENTION_INSTRUCTION}"))
}

pub fn strategy_enrich_system() -> String {
    json_system(&format!("{STRATEGY_ENRICH_BODY}\n\n{NO_INVENTION_INSTRUCTION}"))
}
