// CV parsing prompt templates.

use crate::llm_client::prompts::{json_system, NO_INVENTION_INSTRUCTION};

pub const CV_PARSE_BODY: &str = r#"Sos un parser de CVs. Tu única tarea es convertir el texto de un CV en un JSON con esta estructura:

- metadata: version "1.0", lastUpdated (YYYY-MM-DD), owner (string o "")
- personal: firstName, lastName, email, phone, location, links (linkedin, github, portfolio)
- narrative: headline, coreIdentity, careerGoal, avoidFraming (array). Solo si el CV tiene presentación o resumen.
- experience: array de objetos, del más reciente al más antiguo. Cada uno con:
  - immutable: company, officialTitle, start (YYYY-MM), end (YYYY-MM o "present"), location
  - context: industry, companySize, teamSize (número), reportsTo, stakeholders (array)
  - raw: OBLIGATORIO. Todo el texto del CV correspondiente a ese rol, literal, sin resumir ni recortar.
  - facts: array de { what, metric (número o null), scope, myRole: "owner" | "contributor" | "support" }
  - capabilities: array de { name, evidence: array de strings }
  - technologies: array de { name, yearsInThisRole, usedInProduction (bool), depth: "architecture" | "implementation" | "basic", contexts: array }
  - leadershipSignals: { mentored (número), ledProjects, hiringInvolvement, crossFunctional (bool) }
  - relevanceTags: array de strings
- education: array de { degree, institution, year, notes }
- skills: { technical: array de { name, level: "básico" | "intermedio" | "avanzado" | null, yearsTotal, usedInProduction, lastUsed (YYYY) }, soft: array de strings }
- languages: array de { language, level }
- certifications: array de { name, issuer, year, url }
- constraints: { cannotModify: [], canReframe: [] }
- strategy: targetRoles, avoidRoles (arrays), seniority ("mid" | "senior" | "staff"), workMode ("remoto" | "híbrido" | "presencial"), industries (array)

Si el CV no indica el nivel, lastUsed o yearsTotal de una skill, dejalos en null."#;

pub const CV_PARSE_PROMPT: &str = "Parseá este CV y devolvé el JSON.\n\n{cv_text}";

pub fn cv_parse_system() -> String {
    json_system(&format!("{CV_PARSE_BODY}\n\n{NO_INVENTION_INSTRUCTION}"))
}
