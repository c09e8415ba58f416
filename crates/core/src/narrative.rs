//! Branching-narrative traversal.
//!
//! A narrative is an ordered list of scenes; each scene offers choices that
//! name the index of the next scene. A choice pointing at or past the end of
//! the scene list is the terminal sentinel: picking it completes the
//! narrative. Back navigation is a plain history stack; popping an empty
//! stack means leaving the narrative entirely, which is the caller's job.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::model::NarrativeId;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum NarrativeError {
    #[error("narrative has no scenes")]
    NoScenes,

    #[error("scene {scene} has no choice {choice}")]
    NoSuchChoice { scene: usize, choice: usize },

    #[error("narrative is already complete")]
    Completed,
}

/// One selectable branch out of a scene.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    pub label: String,
    /// Index of the destination scene. `>= scenes.len()` means "the end".
    pub next_scene: usize,
}

impl Choice {
    #[must_use]
    pub fn new(label: impl Into<String>, next_scene: usize) -> Self {
        Self {
            label: label.into(),
            next_scene,
        }
    }
}

/// One scene of a narrative. A scene without choices is a dead stop the user
/// can only back out of; content authors normally end stories through the
/// terminal sentinel instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scene {
    pub text: String,
    pub translation: Option<String>,
    pub image: Option<Url>,
    pub choices: Vec<Choice>,
}

impl Scene {
    #[must_use]
    pub fn new(text: impl Into<String>, choices: Vec<Choice>) -> Self {
        Self {
            text: text.into(),
            translation: None,
            image: None,
            choices,
        }
    }

    #[must_use]
    pub fn with_translation(mut self, translation: impl Into<String>) -> Self {
        self.translation = Some(translation.into());
        self
    }

    #[must_use]
    pub fn with_image(mut self, image: Url) -> Self {
        self.image = Some(image);
        self
    }
}

/// A branching story: scenes plus identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Narrative {
    id: NarrativeId,
    title: String,
    scenes: Vec<Scene>,
}

impl Narrative {
    /// # Errors
    ///
    /// Returns `NarrativeError::NoScenes` for an empty scene list.
    pub fn new(
        id: NarrativeId,
        title: impl Into<String>,
        scenes: Vec<Scene>,
    ) -> Result<Self, NarrativeError> {
        if scenes.is_empty() {
            return Err(NarrativeError::NoScenes);
        }
        Ok(Self {
            id,
            title: title.into(),
            scenes,
        })
    }

    #[must_use]
    pub fn id(&self) -> &NarrativeId {
        &self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn scenes(&self) -> &[Scene] {
        &self.scenes
    }

    /// Advisory content check: scene indices that can never be reached from
    /// scene 0. Authoring mistakes, not traversal errors; an unreachable
    /// scene is dead content but does not break playback.
    #[must_use]
    pub fn unreachable_scenes(&self) -> Vec<usize> {
        let mut seen = vec![false; self.scenes.len()];
        let mut stack = vec![0_usize];
        while let Some(i) = stack.pop() {
            if seen[i] {
                continue;
            }
            seen[i] = true;
            for choice in &self.scenes[i].choices {
                if choice.next_scene < self.scenes.len() && !seen[choice.next_scene] {
                    stack.push(choice.next_scene);
                }
            }
        }
        seen.iter()
            .enumerate()
            .filter_map(|(i, &s)| (!s).then_some(i))
            .collect()
    }
}

/// Where a traversal step landed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Moved to the scene at this index.
    Scene(usize),
    /// The chosen branch pointed past the end of the scene list.
    Completed,
}

/// Where back navigation landed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Back {
    /// Restored the scene at this index.
    Scene(usize),
    /// History was empty; the caller should leave the narrative.
    Exit,
}

/// Stack-based walk through a narrative, starting at scene 0.
#[derive(Debug, Clone)]
pub struct NarrativeTraversal<'a> {
    narrative: &'a Narrative,
    current: usize,
    history: Vec<usize>,
    completed: bool,
}

impl<'a> NarrativeTraversal<'a> {
    #[must_use]
    pub fn new(narrative: &'a Narrative) -> Self {
        Self {
            narrative,
            current: 0,
            history: Vec::new(),
            completed: false,
        }
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current
    }

    #[must_use]
    pub fn current_scene(&self) -> &Scene {
        &self.narrative.scenes()[self.current]
    }

    #[must_use]
    pub fn history(&self) -> &[usize] {
        &self.history
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.completed
    }

    /// Takes the choice at `choice_index` in the current scene.
    ///
    /// Pushes the current scene onto the history stack, then either moves to
    /// the destination scene or, if the destination index is out of range,
    /// marks the traversal complete.
    ///
    /// # Errors
    ///
    /// Returns `NarrativeError::Completed` after the terminal state has been
    /// reached, or `NoSuchChoice` for a bad choice index.
    pub fn choose(&mut self, choice_index: usize) -> Result<Step, NarrativeError> {
        if self.completed {
            return Err(NarrativeError::Completed);
        }
        let Some(choice) = self.current_scene().choices.get(choice_index) else {
            return Err(NarrativeError::NoSuchChoice {
                scene: self.current,
                choice: choice_index,
            });
        };
        let next = choice.next_scene;

        self.history.push(self.current);
        if next >= self.narrative.scenes().len() {
            self.completed = true;
            return Ok(Step::Completed);
        }
        self.current = next;
        Ok(Step::Scene(next))
    }

    /// Pops the history stack and restores that scene. An empty stack means
    /// the traversal is exhausted backwards and the caller should exit.
    pub fn go_back(&mut self) -> Back {
        match self.history.pop() {
            Some(prev) => {
                self.current = prev;
                self.completed = false;
                Back::Scene(prev)
            }
            None => Back::Exit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn three_scene_story() -> Narrative {
        Narrative::new(
            NarrativeId::new("fox"),
            "The fox",
            vec![
                Scene::new(
                    "A fox at a crossroads",
                    vec![Choice::new("Take the river path", 1), Choice::new("Climb", 2)],
                ),
                Scene::new("The river", vec![Choice::new("Swim to the end", 3)]),
                Scene::new("The hill", vec![Choice::new("Descend", 1)]),
            ],
        )
        .unwrap()
    }

    #[test]
    fn empty_narrative_is_rejected() {
        let err = Narrative::new(NarrativeId::new("x"), "X", Vec::new()).unwrap_err();
        assert!(matches!(err, NarrativeError::NoScenes));
    }

    #[test]
    fn in_range_choice_moves_and_records_history() {
        let story = three_scene_story();
        let mut walk = NarrativeTraversal::new(&story);
        assert_eq!(walk.current_index(), 0);

        assert_eq!(walk.choose(0).unwrap(), Step::Scene(1));
        assert_eq!(walk.current_index(), 1);
        assert_eq!(walk.history(), &[0]);
    }

    #[test]
    fn out_of_range_destination_is_terminal() {
        let story = three_scene_story();
        let mut walk = NarrativeTraversal::new(&story);
        walk.choose(0).unwrap();

        // Scene 1's only choice points at index 3, one past the end.
        assert_eq!(walk.choose(0).unwrap(), Step::Completed);
        assert!(walk.is_complete());
        assert!(matches!(walk.choose(0), Err(NarrativeError::Completed)));
    }

    #[test]
    fn back_pops_history_then_exits() {
        let story = three_scene_story();
        let mut walk = NarrativeTraversal::new(&story);
        walk.choose(1).unwrap();
        walk.choose(0).unwrap();
        assert_eq!(walk.current_index(), 1);

        assert_eq!(walk.go_back(), Back::Scene(2));
        assert_eq!(walk.go_back(), Back::Scene(0));
        assert_eq!(walk.go_back(), Back::Exit);
    }

    #[test]
    fn unknown_choice_index_is_an_error() {
        let story = three_scene_story();
        let mut walk = NarrativeTraversal::new(&story);
        assert!(matches!(
            walk.choose(7),
            Err(NarrativeError::NoSuchChoice { scene: 0, choice: 7 })
        ));
    }

    #[test]
    fn unreachable_scene_detection() {
        let story = Narrative::new(
            NarrativeId::new("gap"),
            "Gap",
            vec![
                Scene::new("start", vec![Choice::new("end", 9)]),
                Scene::new("island", vec![]),
            ],
        )
        .unwrap();
        assert_eq!(story.unreachable_scenes(), vec![1]);

        assert!(three_scene_story().unreachable_scenes().is_empty());
    }
}
