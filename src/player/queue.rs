use rand::seq::SliceRandom;
use std::collections::VecDeque;
use thiserror::Error;
use tracing::{debug, info};

use super::track::Track;

/// Errores tipados de la cola; todos son accionables por el usuario y se
/// traducen a [`PlayerResponse`](super::response::PlayerResponse) en el
/// borde de comandos, nunca se propagan como fallas.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueueError {
    #[error("la posición {pos} está fuera de rango (la cola tiene {len} canciones)")]
    OutOfRange { pos: usize, len: usize },
    #[error("la cola está llena (máximo {max} canciones)")]
    Full { max: usize },
    #[error("no se puede poner una playlist completa al frente de la cola")]
    PlaylistAtFront,
}

/// Cola de reproducción por contexto.
///
/// Las posiciones públicas son 1..=N; el almacenamiento interno es 0-based.
/// La conversión vive en un solo lugar ([`TrackQueue::index_of`]) porque el
/// desfase de índices es una clase de bug conocida en este dominio.
///
/// Invariante: la canción en reproducción nunca está en la cola; se saca
/// con [`TrackQueue::pop_next`] al promoverse.
#[derive(Debug)]
pub struct TrackQueue {
    items: VecDeque<Track>,
    max_size: usize,
}

impl TrackQueue {
    pub fn new(max_size: usize) -> Self {
        Self {
            items: VecDeque::new(),
            max_size,
        }
    }

    /// Convierte una posición pública (1-based) a índice interno, validando
    /// el rango. Único punto de conversión de offsets.
    fn index_of(&self, pos: usize) -> Result<usize, QueueError> {
        if pos == 0 || pos > self.items.len() {
            return Err(QueueError::OutOfRange {
                pos,
                len: self.items.len(),
            });
        }
        Ok(pos - 1)
    }

    /// Agrega una canción al final y devuelve su posición pública.
    pub fn push(&mut self, track: Track) -> Result<usize, QueueError> {
        if self.items.len() >= self.max_size {
            return Err(QueueError::Full { max: self.max_size });
        }
        info!("➕ Agregado a la cola: {}", track);
        self.items.push_back(track);
        Ok(self.items.len())
    }

    /// Inserta una canción al frente (se reproducirá después de la actual).
    pub fn push_front(&mut self, track: Track) -> Result<(), QueueError> {
        if self.items.len() >= self.max_size {
            return Err(QueueError::Full { max: self.max_size });
        }
        info!("⏫ Puesto al frente de la cola: {}", track);
        self.items.push_front(track);
        Ok(())
    }

    /// Agrega una playlist completa al final. Pedirla al frente se rechaza
    /// con [`QueueError::PlaylistAtFront`]; el que llama decide el fallback.
    pub fn push_playlist(&mut self, tracks: Vec<Track>, front: bool) -> Result<usize, QueueError> {
        if front {
            return Err(QueueError::PlaylistAtFront);
        }
        if self.items.len() + tracks.len() > self.max_size {
            return Err(QueueError::Full { max: self.max_size });
        }
        let added = tracks.len();
        self.items.extend(tracks);
        info!("➕ Agregadas {} canciones a la cola", added);
        Ok(added)
    }

    /// Saca la siguiente canción. `None` es la señal canónica de cola
    /// agotada, no un error.
    pub fn pop_next(&mut self) -> Option<Track> {
        let next = self.items.pop_front();
        if let Some(ref track) = next {
            debug!("➡️ Siguiente en cola (FIFO): {}", track);
        }
        next
    }

    /// Quita la canción en `pos` (1-based) y la devuelve.
    pub fn remove_at(&mut self, pos: usize) -> Result<Track, QueueError> {
        let index = self.index_of(pos)?;
        // index_of ya validó el rango
        let removed = self.items.remove(index).ok_or(QueueError::OutOfRange {
            pos,
            len: self.items.len(),
        })?;
        debug!("❌ Quitado de la posición {}: {}", pos, removed);
        Ok(removed)
    }

    /// Mueve la canción de `from` a `to` (ambas 1-based) preservando el
    /// orden relativo del resto.
    pub fn move_track(&mut self, from: usize, to: usize) -> Result<Track, QueueError> {
        let from_index = self.index_of(from)?;
        // `to` se valida contra el largo original: mover al final es válido
        self.index_of(to)?;

        let track = self.items.remove(from_index).ok_or(QueueError::OutOfRange {
            pos: from,
            len: self.items.len(),
        })?;
        self.items.insert(to - 1, track.clone());
        debug!("📍 Movido de {} a {}: {}", from, to, track);
        Ok(track)
    }

    /// Mezcla la cola con una permutación uniforme (Fisher–Yates vía
    /// `SliceRandom::shuffle`).
    pub fn shuffle(&mut self) {
        let mut rng = rand::thread_rng();
        self.items.make_contiguous().shuffle(&mut rng);
        info!("🔀 Cola mezclada ({} canciones)", self.items.len());
    }

    /// Vacía la cola y devuelve cuántas canciones había.
    pub fn clear(&mut self) -> usize {
        let removed = self.items.len();
        self.items.clear();
        if removed > 0 {
            info!("🗑️ Cola limpiada ({} canciones)", removed);
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Copia inmutable para mostrar la cola; no muta nada.
    pub fn snapshot(&self) -> QueueSnapshot {
        QueueSnapshot {
            tracks: self.items.iter().cloned().collect(),
        }
    }
}

/// Vista inmutable de la cola, pensada solo para pintar embeds.
#[derive(Debug, Clone, PartialEq)]
pub struct QueueSnapshot {
    pub tracks: Vec<Track>,
}

impl QueueSnapshot {
    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn total_pages(&self, per_page: usize) -> usize {
        if self.tracks.is_empty() {
            1
        } else {
            self.tracks.len().div_ceil(per_page)
        }
    }

    /// Una página concreta (1-based). Páginas fuera de rango salen vacías.
    pub fn page(&self, page: usize, per_page: usize) -> QueuePage {
        let page = page.max(1);
        let start = (page - 1) * per_page;
        let end = (start + per_page).min(self.tracks.len());
        QueuePage {
            tracks: if start < self.tracks.len() {
                self.tracks[start..end].to_vec()
            } else {
                Vec::new()
            },
            number: page,
            total_pages: self.total_pages(per_page),
            // la numeración continúa entre páginas: página 2 arranca en 11
            first_position: start + 1,
        }
    }

    /// Iterador perezoso y reiniciable sobre todas las páginas.
    pub fn pages(&self, per_page: usize) -> impl Iterator<Item = QueuePage> + '_ {
        (1..=self.total_pages(per_page)).map(move |n| self.page(n, per_page))
    }
}

/// Página de cola de tamaño fijo, con la posición pública del primer item.
#[derive(Debug, Clone, PartialEq)]
pub struct QueuePage {
    pub tracks: Vec<Track>,
    pub number: usize,
    pub total_pages: usize,
    pub first_position: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::track::{Requester, TrackInfo};
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn track(title: &str) -> Track {
        Track::new(
            TrackInfo::new(title, "artista", format!("https://tracks.test/{title}")),
            Requester::new(1, "tester"),
        )
    }

    fn titles(queue: &TrackQueue) -> Vec<String> {
        queue
            .snapshot()
            .tracks
            .iter()
            .map(|t| t.title().to_string())
            .collect()
    }

    #[test]
    fn fifo_order_except_front_inserts() {
        let mut queue = TrackQueue::new(100);
        queue.push(track("a")).unwrap();
        queue.push(track("b")).unwrap();
        queue.push_front(track("urgente")).unwrap();
        queue.push(track("c")).unwrap();

        let out: Vec<_> = std::iter::from_fn(|| queue.pop_next())
            .map(|t| t.title().to_string())
            .collect();
        assert_eq!(out, ["urgente", "a", "b", "c"]);
        assert_eq!(queue.pop_next(), None);
    }

    #[test]
    fn push_reports_one_based_position() {
        let mut queue = TrackQueue::new(100);
        assert_eq!(queue.push(track("a")).unwrap(), 1);
        assert_eq!(queue.push(track("b")).unwrap(), 2);
    }

    #[test]
    fn push_rejects_when_full() {
        let mut queue = TrackQueue::new(2);
        queue.push(track("a")).unwrap();
        queue.push(track("b")).unwrap();
        assert_eq!(
            queue.push(track("c")).unwrap_err(),
            QueueError::Full { max: 2 }
        );
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn playlist_at_front_is_rejected_without_touching_queue() {
        let mut queue = TrackQueue::new(100);
        queue.push(track("a")).unwrap();
        let err = queue
            .push_playlist(vec![track("p1"), track("p2")], true)
            .unwrap_err();
        assert_eq!(err, QueueError::PlaylistAtFront);
        assert_eq!(titles(&queue), ["a"]);

        let added = queue
            .push_playlist(vec![track("p1"), track("p2")], false)
            .unwrap();
        assert_eq!(added, 2);
        assert_eq!(titles(&queue), ["a", "p1", "p2"]);
    }

    #[test]
    fn move_track_scenario() {
        // [A,B,C] y move(3,1) => [C,A,B]; remove_at(2) => [C,B]
        let mut queue = TrackQueue::new(100);
        queue.push(track("A")).unwrap();
        queue.push(track("B")).unwrap();
        queue.push(track("C")).unwrap();

        let moved = queue.move_track(3, 1).unwrap();
        assert_eq!(moved.title(), "C");
        assert_eq!(titles(&queue), ["C", "A", "B"]);

        let removed = queue.remove_at(2).unwrap();
        assert_eq!(removed.title(), "A");
        assert_eq!(titles(&queue), ["C", "B"]);
    }

    #[test]
    fn move_preserves_every_element_exactly_once() {
        let mut queue = TrackQueue::new(100);
        for title in ["a", "b", "c", "d", "e"] {
            queue.push(track(title)).unwrap();
        }
        queue.move_track(2, 5).unwrap();

        let mut after = titles(&queue);
        assert_eq!(after.len(), 5);
        after.sort();
        assert_eq!(after, ["a", "b", "c", "d", "e"]);
    }

    #[test]
    fn out_of_range_boundaries_leave_queue_unchanged() {
        let mut queue = TrackQueue::new(100);
        queue.push(track("a")).unwrap();
        queue.push(track("b")).unwrap();
        queue.push(track("c")).unwrap();
        let before = titles(&queue);

        // posición 0, posición N+1 y move con destino inválido
        assert_eq!(
            queue.remove_at(0).unwrap_err(),
            QueueError::OutOfRange { pos: 0, len: 3 }
        );
        assert_eq!(
            queue.remove_at(4).unwrap_err(),
            QueueError::OutOfRange { pos: 4, len: 3 }
        );
        assert_eq!(
            queue.move_track(1, 4).unwrap_err(),
            QueueError::OutOfRange { pos: 4, len: 3 }
        );
        assert_eq!(
            queue.move_track(4, 1).unwrap_err(),
            QueueError::OutOfRange { pos: 4, len: 3 }
        );
        assert_eq!(titles(&queue), before);

        // la posición N sigue siendo válida
        assert_eq!(queue.remove_at(3).unwrap().title(), "c");
    }

    #[test]
    fn shuffle_preserves_length_and_elements() {
        let mut queue = TrackQueue::new(100);
        for i in 0..20 {
            queue.push(track(&format!("t{i}"))).unwrap();
        }
        queue.shuffle();

        let mut after = titles(&queue);
        assert_eq!(after.len(), 20);
        after.sort();
        let mut expected: Vec<_> = (0..20).map(|i| format!("t{i}")).collect();
        expected.sort();
        assert_eq!(after, expected);
    }

    #[test]
    fn shuffle_hits_every_permutation_roughly_evenly() {
        // 3! = 6 permutaciones; con 6000 mezclas cada una espera ~1000
        let mut counts: HashMap<Vec<String>, usize> = HashMap::new();
        for _ in 0..6000 {
            let mut queue = TrackQueue::new(10);
            queue.push(track("x")).unwrap();
            queue.push(track("y")).unwrap();
            queue.push(track("z")).unwrap();
            queue.shuffle();
            *counts.entry(titles(&queue)).or_default() += 1;
        }

        assert_eq!(counts.len(), 6);
        for (perm, count) in counts {
            assert!(
                (700..=1300).contains(&count),
                "permutación {perm:?} salió {count} veces"
            );
        }
    }

    #[test]
    fn clear_is_noop_on_empty() {
        let mut queue = TrackQueue::new(100);
        assert_eq!(queue.clear(), 0);
        queue.push(track("a")).unwrap();
        queue.push(track("b")).unwrap();
        assert_eq!(queue.clear(), 2);
        assert!(queue.is_empty());
    }

    #[test]
    fn pagination_boundaries() {
        let mut queue = TrackQueue::new(100);
        for i in 1..=25 {
            queue.push(track(&format!("t{i}"))).unwrap();
        }
        let snapshot = queue.snapshot();

        assert_eq!(snapshot.total_pages(10), 3);

        let first = snapshot.page(1, 10);
        assert_eq!(first.tracks.len(), 10);
        assert_eq!(first.first_position, 1);
        assert_eq!(first.tracks[0].title(), "t1");

        let last = snapshot.page(3, 10);
        assert_eq!(last.tracks.len(), 5);
        assert_eq!(last.first_position, 21);
        assert_eq!(last.tracks[4].title(), "t25");

        // fuera de rango: página vacía, no panic
        assert!(snapshot.page(4, 10).tracks.is_empty());

        // el iterador de páginas es reiniciable
        let pages: Vec<_> = snapshot.pages(10).collect();
        assert_eq!(pages.len(), 3);
        let again: Vec<_> = snapshot.pages(10).collect();
        assert_eq!(pages, again);
    }

    #[test]
    fn empty_snapshot_still_has_one_page() {
        let queue = TrackQueue::new(100);
        let snapshot = queue.snapshot();
        assert_eq!(snapshot.total_pages(10), 1);
        assert!(snapshot.page(1, 10).tracks.is_empty());
    }
}
